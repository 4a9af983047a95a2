use async_trait::async_trait;

use crate::prompt::CONNECTIVITY_PROBE;

/// Per-call tuning knobs. `None` leaves the backend default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn tuned(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_output_tokens: Some(max_output_tokens),
        }
    }
}

/// Generative text backend, implemented per LLM service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Generate a reply for a text prompt
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> anyhow::Result<String>;

    /// Generate a reply for a prompt plus one attached media blob
    async fn generate_with_media(
        &self,
        prompt: &str,
        media_type: &str,
        data: &[u8],
        options: &GenerationOptions,
    ) -> anyhow::Result<String>;

    /// Cheap connectivity probe used at startup and by diagnostics
    async fn warmup(&self) -> anyhow::Result<String> {
        self.generate(CONNECTIVITY_PROBE, &GenerationOptions::default())
            .await
    }
}

/// Speech-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &str;

    /// Transcribe an audio blob to plain text
    async fn transcribe(
        &self,
        audio: &[u8],
        file_name: &str,
        media_type: &str,
    ) -> anyhow::Result<String>;
}

/// Text-to-speech backend
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize speech, returning encoded audio bytes (MP3)
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_carry_no_tuning() {
        let options = GenerationOptions::default();
        assert!(options.temperature.is_none());
        assert!(options.max_output_tokens.is_none());
    }

    #[test]
    fn tuned_options_carry_both_knobs() {
        let options = GenerationOptions::tuned(0.7, 500);
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.max_output_tokens, Some(500));
    }
}
