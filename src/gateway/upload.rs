use axum::extract::Multipart;

use super::error::ApiError;

/// One uploaded binary part plus the metadata the browser sent with it.
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Declared media type, or the octet-stream default the analysis
    /// endpoints assume.
    pub fn media_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Form fields understood by the upload endpoints. Unknown fields are
/// ignored.
#[derive(Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    pub instructions: String,
    pub kind: Option<String>,
}

pub async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut out = UploadRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed reading multipart 'file' field: {e}"))
                })?;
                out.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "instructions" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!(
                        "Failed reading multipart 'instructions' field: {e}"
                    ))
                })?;
                out.instructions = text.trim().to_string();
            }
            "kind" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed reading multipart 'kind' field: {e}"))
                })?;
                if !text.trim().is_empty() {
                    out.kind = Some(text.trim().to_string());
                }
            }
            _ => {}
        }
    }

    Ok(out)
}
