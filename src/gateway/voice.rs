//! Voice round trip: audio or image in, spoken reply out.

use axum::{Json, extract::Multipart, extract::State, response::Response};
use serde_json::{Value, json};

use crate::media::{self, MediaKind, MediaKindError};
use crate::prompt;
use crate::providers::GenerationOptions;

use super::error::{ApiError, ApiResult};
use super::reply::{xml_error, xml_response};
use super::state::AppState;
use super::upload::{UploadedFile, read_upload};

struct VoiceOutcome {
    input_text: String,
    ai_response: String,
    summary: String,
    audio_file: Option<String>,
}

pub async fn voice_session(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let upload = read_upload(multipart).await?;
    let Some(file) = upload.file else {
        return Err(ApiError::bad_request("Falta el archivo de audio ('file')"));
    };

    let outcome =
        run_voice_session(&state, file, upload.kind.as_deref(), prompt::voice_note).await?;
    let mut body = json!({
        "status": "ok",
        "input_text": outcome.input_text,
        "ai_response": outcome.ai_response,
        "summary": outcome.summary,
    });
    if let Some(name) = outcome.audio_file {
        body["audio_file"] = json!(name);
    }
    Ok(Json(body))
}

pub async fn voice_session_xml(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return xml_error(err.message),
    };
    let Some(file) = upload.file else {
        return xml_error("Falta el archivo ('file')");
    };

    match run_voice_session(
        &state,
        file,
        upload.kind.as_deref(),
        prompt::voice_session_note,
    )
    .await
    {
        Ok(outcome) => {
            let mut fields = vec![
                ("status", "ok".to_string()),
                ("input_text", outcome.input_text),
                ("ai_response", outcome.ai_response),
                ("summary", outcome.summary),
            ];
            if let Some(name) = outcome.audio_file {
                fields.push(("audio_file", name));
            }
            xml_response(&fields)
        }
        Err(err) => xml_error(err.message),
    }
}

async fn run_voice_session(
    state: &AppState,
    file: UploadedFile,
    declared: Option<&str>,
    note_prompt: fn(&str) -> String,
) -> Result<VoiceOutcome, ApiError> {
    let media_type = file.media_type();
    let kind = media::classify_upload(declared, &file.file_name, file.content_type.as_deref())
        .map_err(|err| match err {
            MediaKindError::UnknownDeclared(kind) => ApiError::bad_request(format!(
                "Tipo declarado '{kind}' no soportado. Usa 'audio' o 'image'."
            )),
            MediaKindError::Unclassifiable => {
                ApiError::bad_request("Tipo de archivo no soportado. Envía audio o imagen.")
            }
        })?;

    let input_text = match kind {
        MediaKind::Audio => {
            let text = state
                .transcriber
                .transcribe(&file.bytes, &file.file_name, &media_type)
                .await?;
            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(ApiError::bad_request("No se pudo transcribir audio"));
            }
            text
        }
        MediaKind::Image => state
            .generator
            .generate_with_media(
                prompt::image_reading(),
                &media_type,
                &file.bytes,
                &GenerationOptions::default(),
            )
            .await
            .map_err(|err| ApiError::internal(format!("Error al analizar la imagen: {err}")))?,
    };

    let reply_prompt = prompt::voice_reply(&input_text);
    let ai_response = state
        .generator
        .generate(&reply_prompt, &GenerationOptions::default())
        .await?;

    let summary = match state
        .generator
        .generate(&note_prompt(&ai_response), &GenerationOptions::default())
        .await
    {
        Ok(summary) => summary,
        Err(err) => {
            tracing::warn!("voice note generation failed: {err}");
            "(sin resumen disponible)".to_string()
        }
    };

    // Losing the audio degrades the reply to text-only instead of failing
    // the whole session.
    let audio_file = match synthesize_reply(state, &ai_response).await {
        Ok(name) => Some(name),
        Err(err) => {
            tracing::warn!("no se pudo generar el audio: {err}");
            None
        }
    };

    Ok(VoiceOutcome {
        input_text,
        ai_response,
        summary,
        audio_file,
    })
}

async fn synthesize_reply(state: &AppState, text: &str) -> anyhow::Result<String> {
    let audio = state.synthesizer.synthesize(text).await?;
    let artifact = state.media.store_mp3(&audio).await?;
    Ok(artifact.file_name)
}
