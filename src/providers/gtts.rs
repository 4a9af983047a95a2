//! Text-to-speech through the public Google Translate endpoint, the same
//! service the gTTS tooling wraps. Long texts are split into chunks below
//! the endpoint's length ceiling and the MP3 segments are concatenated.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::SynthesisConfig;
use crate::providers::traits::SpeechSynthesizer;

/// The endpoint rejects queries much beyond this many characters.
const MAX_CHUNK_CHARS: usize = 180;

pub struct TranslateTtsSynthesizer {
    pub(crate) base_url: String,
    pub(crate) language: String,
    client: Client,
}

impl TranslateTtsSynthesizer {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self::with_base_url(config, &config.base_url)
    }

    pub fn with_base_url(config: &SynthesisConfig, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

/// Splits on whitespace into chunks of at most `max_chars` characters. A
/// single oversized token still becomes its own chunk.
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechSynthesizer for TranslateTtsSynthesizer {
    fn name(&self) -> &str {
        "google-translate"
    }

    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("no text to synthesize");
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx_text = idx.to_string();
            let text_len = chunk.chars().count().to_string();
            let response = self
                .client
                .get(format!("{}/translate_tts", self.base_url))
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", self.language.as_str()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx_text.as_str()),
                    ("textlen", text_len.as_str()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                anyhow::bail!("TTS endpoint error ({status}) on chunk {idx}");
            }
            audio.extend_from_slice(&response.bytes().await?);
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("hola mundo", 180), vec!["hola mundo".to_string()]);
    }

    #[test]
    fn long_text_splits_at_word_boundaries() {
        let text = "uno dos tres cuatro cinco";
        let chunks = split_text(text, 12);
        assert_eq!(chunks, vec!["uno dos tres", "cuatro cinco"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
        }
    }

    #[test]
    fn oversized_word_stays_whole() {
        let chunks = split_text("electroencefalografista corta", 10);
        assert_eq!(chunks[0], "electroencefalografista");
        assert_eq!(chunks[1], "corta");
    }

    #[test]
    fn accented_text_counts_characters_not_bytes() {
        // 10 accented chars are more than 10 bytes; the limit is chars.
        let chunks = split_text("ááá ééé ííí", 7);
        assert_eq!(chunks, vec!["ááá ééé", "ííí"]);
    }

    #[test]
    fn whitespace_only_text_yields_no_chunks() {
        assert!(split_text("  \n\t ", 180).is_empty());
    }
}
