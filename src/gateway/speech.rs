//! Speech synthesis, transcription, and retrieval of stored audio.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::wire;

use super::error::{ApiError, ApiResult};
use super::reply::{MALFORMED_XML_MSG, audio_response, xml_error, xml_response};
use super::state::AppState;
use super::upload::read_upload;

const MISSING_AUDIO_MSG: &str = "Falta el archivo de audio ('file')";

#[derive(Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    text: String,
}

/// Key-value variant replies with the synthesized MP3 itself.
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> ApiResult<Response> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Falta el campo 'text'"));
    }

    let audio = state.synthesizer.synthesize(text).await?;
    let artifact = state.media.store_mp3(&audio).await?;
    tracing::debug!("stored synthesized speech as {}", artifact.file_name);
    Ok(audio_response(audio))
}

/// Tag-based variant replies with a document pointing at the stored file,
/// retrievable via `GET /media/{name}`.
pub async fn text_to_speech_xml(State(state): State<AppState>, body: Bytes) -> Response {
    let doc = match wire::decode(&body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!("rejected speech request body: {err}");
            return xml_error(MALFORMED_XML_MSG);
        }
    };
    let text = doc.text("text").unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return xml_error("Falta el campo <text> en el XML");
    }

    let audio = match state.synthesizer.synthesize(&text).await {
        Ok(audio) => audio,
        Err(err) => return xml_error(err.to_string()),
    };
    let artifact = match state.media.store_mp3(&audio).await {
        Ok(artifact) => artifact,
        Err(err) => return xml_error(err.to_string()),
    };

    xml_response(&[
        ("status", "ok".to_string()),
        ("message", "Audio generado exitosamente".to_string()),
        ("file", artifact.file_name),
    ])
}

pub async fn speech_to_text(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let upload = read_upload(multipart).await?;
    let Some(file) = upload.file else {
        return Err(ApiError::bad_request(MISSING_AUDIO_MSG));
    };

    let text = state
        .transcriber
        .transcribe(&file.bytes, &file.file_name, &file.media_type())
        .await?;
    Ok(Json(json!({ "text": text })))
}

pub async fn speech_to_text_xml(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return xml_error(err.message),
    };
    let Some(file) = upload.file else {
        return xml_error(MISSING_AUDIO_MSG);
    };

    match state
        .transcriber
        .transcribe(&file.bytes, &file.file_name, &file.media_type())
        .await
    {
        Ok(text) => xml_response(&[("text", text)]),
        Err(err) => xml_error(err.to_string()),
    }
}

/// Serves artifacts created by the synthesis endpoints.
pub async fn fetch_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    match state.media.read(&name).await? {
        Some((bytes, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        None => Err(ApiError::not_found("Archivo no encontrado")),
    }
}
