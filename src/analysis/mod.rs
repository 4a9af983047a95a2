//! Reshaping of generative output for the file-analysis endpoints.
//!
//! The model is asked for machine-readable JSON but routinely wraps it in a
//! code fence or answers in prose. Callers get a tagged outcome instead of a
//! silently mixed payload, and decide per endpoint how each case renders.

use serde_json::{Map, Value};

/// Key carrying unparseable model text in a reply payload.
pub const RAW_TEXT_KEY: &str = "raw_model_text";

const FILENAME_KEY: &str = "filename";
const MIME_TYPE_KEY: &str = "mime_type";

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The model produced a JSON object; keys pass through to the reply.
    Structured(Map<String, Value>),
    /// Anything else, kept verbatim after trimming.
    RawText(String),
}

impl AnalysisOutcome {
    /// Flattens the outcome into a reply payload, filling `filename` and
    /// `mime_type` only when the model did not already claim those keys.
    pub fn into_payload(self, file_name: &str, media_type: &str) -> Map<String, Value> {
        let mut payload = match self {
            Self::Structured(map) => map,
            Self::RawText(text) => {
                let mut map = Map::new();
                map.insert(RAW_TEXT_KEY.to_string(), Value::String(text));
                map
            }
        };
        payload
            .entry(FILENAME_KEY)
            .or_insert_with(|| Value::String(file_name.to_string()));
        payload
            .entry(MIME_TYPE_KEY)
            .or_insert_with(|| Value::String(media_type.to_string()));
        payload
    }
}

/// Parses model text into an [`AnalysisOutcome`]. Only a top-level JSON
/// object counts as structured; arrays and bare scalars stay raw so reply
/// payloads always have string keys.
pub fn reshape_model_output(text: &str) -> AnalysisOutcome {
    let trimmed = text.trim();
    match serde_json::from_str::<Value>(strip_code_fence(trimmed)) {
        Ok(Value::Object(map)) => AnalysisOutcome::Structured(map),
        _ => AnalysisOutcome::RawText(trimmed.to_string()),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_object_parses_as_structured() {
        let outcome = reshape_model_output(r#"{"texto": "receta", "paginas": 2}"#);
        match outcome {
            AnalysisOutcome::Structured(map) => {
                assert_eq!(map.get("texto"), Some(&json!("receta")));
                assert_eq!(map.get("paginas"), Some(&json!(2)));
            }
            AnalysisOutcome::RawText(text) => panic!("expected structured, got raw {text:?}"),
        }
    }

    #[test]
    fn fenced_json_object_parses_as_structured() {
        let outcome = reshape_model_output("```json\n{\"texto\": \"ok\"}\n```");
        assert!(matches!(outcome, AnalysisOutcome::Structured(_)));
        let outcome = reshape_model_output("```\n{\"texto\": \"ok\"}\n```");
        assert!(matches!(outcome, AnalysisOutcome::Structured(_)));
    }

    #[test]
    fn prose_stays_raw_and_trimmed() {
        let outcome = reshape_model_output("  El documento es una receta.\n");
        assert_eq!(
            outcome,
            AnalysisOutcome::RawText("El documento es una receta.".to_string())
        );
    }

    #[test]
    fn non_object_json_stays_raw() {
        assert!(matches!(
            reshape_model_output("[1, 2, 3]"),
            AnalysisOutcome::RawText(_)
        ));
        assert!(matches!(
            reshape_model_output("\"hola\""),
            AnalysisOutcome::RawText(_)
        ));
    }

    #[test]
    fn payload_gains_file_keys_when_missing() {
        let payload = reshape_model_output("{\"texto\": \"ok\"}")
            .into_payload("receta.png", "image/png");
        assert_eq!(payload.get("filename"), Some(&json!("receta.png")));
        assert_eq!(payload.get("mime_type"), Some(&json!("image/png")));
    }

    #[test]
    fn model_claimed_file_keys_win() {
        let payload = reshape_model_output("{\"filename\": \"propio.pdf\"}")
            .into_payload("real.pdf", "application/pdf");
        assert_eq!(payload.get("filename"), Some(&json!("propio.pdf")));
        assert_eq!(payload.get("mime_type"), Some(&json!("application/pdf")));
    }

    #[test]
    fn raw_payload_carries_original_text() {
        let payload = reshape_model_output("no es json").into_payload("a.bin", "application/octet-stream");
        assert_eq!(payload.get(RAW_TEXT_KEY), Some(&json!("no es json")));
    }
}
