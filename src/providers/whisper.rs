//! Speech-to-text through an OpenAI-compatible transcription endpoint.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;

use crate::config::TranscriptionConfig;
use crate::providers::traits::Transcriber;

pub struct WhisperApiTranscriber {
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) language: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperApiTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self::with_base_url(config, &config.base_url)
    }

    pub fn with_base_url(config: &TranscriptionConfig, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    fn name(&self) -> &str {
        "whisper-api"
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        media_type: &str,
    ) -> anyhow::Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "transcription API key not configured. Set OPENAI_API_KEY or [transcription].api_key"
            )
        })?;

        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(media_type)
            .with_context(|| format!("invalid audio content type `{media_type}`"))?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Whisper API error ({status}): {error_text}");
        }

        let result: TranscriptionResponse = response.json().await?;
        Ok(result.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash_and_keeps_language() {
        let config = TranscriptionConfig {
            api_key: Some("k".into()),
            ..TranscriptionConfig::default()
        };
        let transcriber = WhisperApiTranscriber::with_base_url(&config, "http://mock/");
        assert_eq!(transcriber.base_url, "http://mock");
        assert_eq!(transcriber.language, "es");
        assert_eq!(transcriber.model, "whisper-1");
    }

    #[tokio::test]
    async fn transcribe_fails_without_key() {
        let transcriber = WhisperApiTranscriber::new(&TranscriptionConfig::default());
        let err = transcriber
            .transcribe(b"audio", "voz.wav", "audio/wav")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn response_deserialization() {
        let response: TranscriptionResponse =
            serde_json::from_str(r#"{"text": " me duele la cabeza "}"#).unwrap();
        assert_eq!(response.text, " me duele la cabeza ");
    }
}
