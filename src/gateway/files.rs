//! Document and image analysis uploads.

use axum::{Json, extract::Multipart, extract::State, response::Response};
use serde_json::Value;

use crate::analysis;
use crate::prompt;
use crate::providers::GenerationOptions;
use crate::wire;

use super::error::{ApiError, ApiResult};
use super::reply::{xml_error, xml_payload};
use super::state::AppState;
use super::upload::{UploadedFile, read_upload};

const MISSING_FILE_MSG: &str = "Debes enviar un archivo en form-data con la clave 'file'.";

pub async fn analyze_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let upload = read_upload(multipart).await?;
    let Some(file) = named_file(upload.file) else {
        return Err(ApiError::bad_request(MISSING_FILE_MSG));
    };

    let payload = analyze(&state, &file, &upload.instructions, true)
        .await
        .map_err(|err| ApiError::internal(format!("Error procesando archivo con Gemini: {err}")))?;
    Ok(Json(payload))
}

pub async fn analyze_xml(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(err) => return xml_error(err.message),
    };
    let Some(file) = named_file(upload.file) else {
        return xml_error(MISSING_FILE_MSG);
    };

    let payload = match analyze(&state, &file, &upload.instructions, false).await {
        Ok(payload) => payload,
        Err(err) => return xml_error(format!("Error procesando archivo con Gemini: {err}")),
    };
    // Analysis payloads nest, so they go through the structured encoder
    // instead of the flat reply helper.
    match wire::encode_tree(&payload) {
        Ok(body) => xml_payload(body),
        Err(err) => xml_error(format!("Error procesando archivo con Gemini: {err}")),
    }
}

/// A missing upload and an upload with a blank filename are both treated
/// as "no file sent".
fn named_file(file: Option<UploadedFile>) -> Option<UploadedFile> {
    file.filter(|file| !file.file_name.is_empty())
}

async fn analyze(
    state: &AppState,
    file: &UploadedFile,
    instructions: &str,
    structured: bool,
) -> anyhow::Result<Value> {
    let media_type = file.media_type();
    let request = prompt::file_analysis(instructions, structured);
    let raw = state
        .generator
        .generate_with_media(
            &request,
            &media_type,
            &file.bytes,
            &GenerationOptions::default(),
        )
        .await?;
    let outcome = analysis::reshape_model_output(&raw);
    Ok(Value::Object(
        outcome.into_payload(&file.file_name, &media_type),
    ))
}
