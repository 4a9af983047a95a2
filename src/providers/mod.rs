pub mod did;
pub mod gemini;
pub mod gtts;
pub mod traits;
pub mod whisper;

pub use did::{AgentsReply, AvatarClient};
pub use traits::{GenerationOptions, SpeechSynthesizer, TextGenerator, Transcriber};

use crate::config::{GenerativeConfig, SynthesisConfig, TranscriptionConfig};

/// Factory: create the right generative backend from config
pub fn create_generator(config: &GenerativeConfig) -> anyhow::Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "gemini" | "google" | "google-gemini" => {
            Ok(Box::new(gemini::GeminiGenerator::new(config)))
        }
        other => anyhow::bail!(
            "Unknown generative provider: {other}. Supported: gemini (aliases: google, google-gemini)."
        ),
    }
}

/// Factory: create the right transcription backend from config
pub fn create_transcriber(config: &TranscriptionConfig) -> anyhow::Result<Box<dyn Transcriber>> {
    match config.provider.as_str() {
        "whisper-api" | "openai" => Ok(Box::new(whisper::WhisperApiTranscriber::new(config))),
        other => anyhow::bail!(
            "Unknown transcription provider: {other}. Supported: whisper-api (alias: openai)."
        ),
    }
}

/// Factory: create the right speech backend from config
pub fn create_synthesizer(config: &SynthesisConfig) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    match config.provider.as_str() {
        "google-translate" | "gtts" => {
            Ok(Box::new(gtts::TranslateTtsSynthesizer::new(config)))
        }
        other => anyhow::bail!(
            "Unknown synthesis provider: {other}. Supported: google-translate (alias: gtts)."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_gemini_and_aliases() {
        for name in ["gemini", "google", "google-gemini"] {
            let config = GenerativeConfig {
                provider: name.into(),
                ..GenerativeConfig::default()
            };
            let generator = create_generator(&config).unwrap();
            assert_eq!(generator.name(), "gemini");
        }
    }

    #[test]
    fn factory_rejects_unknown_generator() {
        let config = GenerativeConfig {
            provider: "llama-local".into(),
            ..GenerativeConfig::default()
        };
        let err = create_generator(&config).err().unwrap();
        assert!(err.to_string().contains("llama-local"));
    }

    #[test]
    fn factory_whisper() {
        let transcriber = create_transcriber(&TranscriptionConfig::default()).unwrap();
        assert_eq!(transcriber.name(), "whisper-api");
    }

    #[test]
    fn factory_translate_tts() {
        let synthesizer = create_synthesizer(&SynthesisConfig::default()).unwrap();
        assert_eq!(synthesizer.name(), "google-translate");
    }

    #[test]
    fn factory_rejects_unknown_synthesizer() {
        let config = SynthesisConfig {
            provider: "espeak".into(),
            ..SynthesisConfig::default()
        };
        assert!(create_synthesizer(&config).is_err());
    }
}
