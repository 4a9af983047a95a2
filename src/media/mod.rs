//! Upload classification and generated-audio artifacts.

pub mod store;

pub use store::{ArtifactStore, StoredArtifact};

use thiserror::Error;

/// Extensions treated as audio. Matched by containment on the lowercased
/// file name, the loose rule existing clients already depend on.
const AUDIO_EXTENSIONS: &[&str] = &[".wav", ".mp3", ".webm", ".m4a"];

/// Extensions treated as images (PDF rides along for document scans).
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaKindError {
    /// The client declared a kind this service does not handle.
    #[error("unsupported declared kind `{0}`")]
    UnknownDeclared(String),
    /// Neither the declaration, the name, nor the content type gave a kind.
    #[error("file does not look like audio or image")]
    Unclassifiable,
}

/// Decides how to treat an upload. An explicit `kind` declaration wins; only
/// without one do the name/content-type heuristics run. Audio is checked
/// first, so a name matching both families lands on audio.
pub fn classify_upload(
    declared: Option<&str>,
    file_name: &str,
    content_type: Option<&str>,
) -> Result<MediaKind, MediaKindError> {
    if let Some(declared) = declared {
        let normalized = declared.trim().to_lowercase();
        if !normalized.is_empty() {
            return match normalized.as_str() {
                "audio" => Ok(MediaKind::Audio),
                "image" => Ok(MediaKind::Image),
                _ => Err(MediaKindError::UnknownDeclared(declared.trim().to_string())),
            };
        }
    }

    let name = file_name.to_lowercase();
    let mime = content_type.unwrap_or("");
    if AUDIO_EXTENSIONS.iter().any(|ext| name.contains(ext)) || mime.contains("audio") {
        Ok(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.iter().any(|ext| name.contains(ext)) {
        Ok(MediaKind::Image)
    } else {
        Err(MediaKindError::Unclassifiable)
    }
}
