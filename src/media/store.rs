//! Filesystem store for generated audio artifacts.
//!
//! Artifacts get random names so concurrent requests never overwrite each
//! other; clients fetch them back by the exact name a reply handed out.

use std::path::PathBuf;

use anyhow::Context;
use uuid::Uuid;

pub struct ArtifactStore {
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredArtifact {
    /// Name the client uses to fetch the artifact back.
    pub file_name: String,
    pub path: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create media dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Persists synthesized speech under a fresh random `.mp3` name.
    pub async fn store_mp3(&self, bytes: &[u8]) -> anyhow::Result<StoredArtifact> {
        let file_name = format!("{}.mp3", Uuid::new_v4().simple());
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write artifact {}", path.display()))?;
        Ok(StoredArtifact { file_name, path })
    }

    /// Looks up an artifact by name. Returns the bytes and content type, or
    /// `None` for unknown names and anything that is not a plain artifact
    /// name (separators, traversal, dotfiles).
    pub async fn read(&self, name: &str) -> anyhow::Result<Option<(Vec<u8>, &'static str)>> {
        if !safe_artifact_name(name) {
            return Ok(None);
        }
        let path = self.dir.join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some((bytes, content_type_for(name)))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read artifact {}", path.display()))
            }
        }
    }
}

fn safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".mp3") {
        "audio/mpeg"
    } else if name.ends_with(".wav") {
        "audio/wav"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stored_artifact_reads_back() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let artifact = store.store_mp3(b"mp3-bytes").await.unwrap();
        let (bytes, content_type) = store.read(&artifact.file_name).await.unwrap().unwrap();
        assert_eq!(bytes, b"mp3-bytes");
        assert_eq!(content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn names_are_unique_per_store() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        let first = store.store_mp3(b"a").await.unwrap();
        let second = store.store_mp3(b"b").await.unwrap();
        assert_ne!(first.file_name, second.file_name);
        assert!(first.file_name.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn unknown_name_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        assert!(store.read("missing.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn traversal_names_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path()).unwrap();
        for name in ["../etc/passwd", "a/b.mp3", "..", ".hidden", ""] {
            assert!(store.read(name).await.unwrap().is_none(), "{name}");
        }
    }
}
