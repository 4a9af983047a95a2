//! Google Gemini generation over the REST `generateContent` API.
//!
//! One backend serves both plain prompts and prompts with an inline media
//! blob (images, PDFs, audio) attached.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GenerativeConfig;
use crate::providers::traits::{GenerationOptions, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiGenerator {
    pub(crate) api_key: Option<String>,
    pub(crate) model: String,
    pub(crate) base_url: String,
    client: Client,
}

// ── API request/response types ───────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn media(media_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: media_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GeminiGenerator {
    pub fn new(config: &GenerativeConfig) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Self::with_base_url(config, base_url)
    }

    /// Same as [`GeminiGenerator::new`] with an explicit endpoint, which is
    /// how tests point the generator at a local mock.
    pub fn with_base_url(config: &GenerativeConfig, base_url: &str) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn request_url(&self) -> anyhow::Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Gemini API key not configured. Set GOOGLE_GEMINI_API_KEY or [generative].api_key"
            )
        })?;
        let model_path = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        Ok(format!(
            "{}/v1beta/{model_path}:generateContent?key={api_key}",
            self.base_url
        ))
    }

    async fn send(&self, request: &GenerateContentRequest) -> anyhow::Result<String> {
        let url = self.request_url()?;
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({status}): {error_text}");
        }

        let result: GenerateContentResponse = response.json().await?;
        extract_text(result)
    }
}

fn generation_config(options: &GenerationOptions) -> Option<GenerationConfig> {
    if options.temperature.is_none() && options.max_output_tokens.is_none() {
        return None;
    }
    Some(GenerationConfig {
        temperature: options.temperature,
        max_output_tokens: options.max_output_tokens,
    })
}

/// Concatenates every text part of the first candidate, the same view the
/// legacy clients got of a reply.
fn extract_text(response: GenerateContentResponse) -> anyhow::Result<String> {
    if let Some(err) = response.error {
        anyhow::bail!("Gemini API error: {}", err.message);
    }
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .ok_or_else(|| anyhow::anyhow!("No response from Gemini"))?;
    Ok(parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<String>()
        .trim()
        .to_string())
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> anyhow::Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::text(prompt)],
            }],
            generation_config: generation_config(options),
        };
        self.send(&request).await
    }

    async fn generate_with_media(
        &self,
        prompt: &str,
        media_type: &str,
        data: &[u8],
        options: &GenerationOptions,
    ) -> anyhow::Result<String> {
        // Media first, instruction second; replies read better that way.
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::media(media_type, data), Part::text(prompt)],
            }],
            generation_config: generation_config(options),
        };
        self.send(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> GenerativeConfig {
        GenerativeConfig {
            api_key: api_key.map(String::from),
            ..GenerativeConfig::default()
        }
    }

    #[test]
    fn generator_creates_without_key() {
        let generator = GeminiGenerator::new(&make_config(None));
        assert!(generator.api_key.is_none());
        assert_eq!(generator.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn request_url_requires_a_key() {
        let generator = GeminiGenerator::new(&make_config(None));
        let err = generator.request_url().unwrap_err();
        assert!(err.to_string().contains("GOOGLE_GEMINI_API_KEY"));
    }

    #[test]
    fn request_url_prefixes_bare_model_names() {
        let generator = GeminiGenerator::with_base_url(&make_config(Some("k")), "http://mock/");
        assert_eq!(
            generator.request_url().unwrap(),
            "http://mock/v1beta/models/gemini-2.5-flash:generateContent?key=k"
        );

        let mut config = make_config(Some("k"));
        config.model = "models/gemini-1.5-pro".to_string();
        let generator = GeminiGenerator::with_base_url(&config, "http://mock");
        assert_eq!(
            generator.request_url().unwrap(),
            "http://mock/v1beta/models/gemini-1.5-pro:generateContent?key=k"
        );
    }

    #[test]
    fn request_serialization_uses_camel_case_wire_names() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::media("image/png", b"png"), Part::text("Hola")],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.7),
                max_output_tokens: Some(500),
            }),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"inlineData\""));
        assert!(json.contains("\"mimeType\":\"image/png\""));
        assert!(json.contains("\"text\":\"Hola\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":500"));
    }

    #[test]
    fn untuned_options_omit_generation_config() {
        let request = GenerateContentRequest {
            contents: vec![],
            generation_config: generation_config(&GenerationOptions::default()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("generationConfig"));
    }

    #[test]
    fn extract_concatenates_text_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"text": "Hola "}, {"text": "mundo"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hola mundo");
    }

    #[test]
    fn extract_fails_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("No response from Gemini"));
    }

    #[test]
    fn extract_surfaces_api_error_body() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"error": {"message": "Invalid API key"}}"#).unwrap();
        let err = extract_text(response).unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }
}
