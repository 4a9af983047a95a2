//! Consultation endpoints. The clinician variant is tag-based only; the
//! patient variant picks its wire family from the caller's user agent.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::prompt::{self, ConsultationInput};
use crate::providers::GenerationOptions;
use crate::wire::{self, WireDoc};

use super::reply::{degraded_generation, xml_response};
use super::state::AppState;

pub async fn doctor_note(State(state): State<AppState>, body: Bytes) -> Response {
    let doc = wire::decode_lossy(&body);
    let input = consultation_from_doc(&doc);
    let note = prompt::clinician_note(&input);
    let text = match state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await
    {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("clinician note generation failed: {err}");
            degraded_generation(&err)
        }
    };
    xml_response(&[("recommendation", text)])
}

pub async fn patient_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let kind = wire::classify(user_agent(&headers));
    let input = if kind.is_mobile() {
        // Mobile clients speak JSON. An unreadable body degrades to an
        // empty consultation, same as the lossy tag-based path.
        let value = serde_json::from_slice::<Value>(&body).unwrap_or_default();
        consultation_from_json(&value)
    } else {
        consultation_from_doc(&wire::decode_lossy(&body))
    };

    let note = prompt::patient_reply(&input);
    let text = match state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await
    {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("patient reply generation failed: {err}");
            degraded_generation(&err)
        }
    };

    if kind.is_mobile() {
        Json(json!({ "message": text })).into_response()
    } else {
        xml_response(&[("message", text)])
    }
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

fn consultation_from_doc(doc: &WireDoc) -> ConsultationInput {
    ConsultationInput {
        patient: doc.section("patient").unwrap_or_default().to_vec(),
        symptoms: doc.text("symptoms").unwrap_or_default().to_string(),
        studies: doc.list("studies").unwrap_or_default().to_vec(),
    }
}

fn consultation_from_json(value: &Value) -> ConsultationInput {
    let patient = value
        .get("patient")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(name, value)| (name.clone(), scalar_text(value)))
                .collect()
        })
        .unwrap_or_default();
    let symptoms = value
        .get("symptoms")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let studies = value
        .get("studies")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(scalar_text).collect())
        .unwrap_or_default();
    ConsultationInput {
        patient,
        symptoms,
        studies,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_consultation_coerces_scalars() {
        let value = json!({
            "patient": { "nombre": "Ana", "edad": 34 },
            "symptoms": "dolor de cabeza",
            "studies": ["rx-torax", 42],
        });
        let input = consultation_from_json(&value);
        assert_eq!(input.symptoms, "dolor de cabeza");
        assert!(input.patient.contains(&("edad".to_string(), "34".to_string())));
        assert_eq!(input.studies, vec!["rx-torax".to_string(), "42".to_string()]);
    }

    #[test]
    fn json_consultation_tolerates_garbage() {
        let input = consultation_from_json(&Value::Null);
        assert!(input.patient.is_empty());
        assert!(input.symptoms.is_empty());
        assert!(input.studies.is_empty());
    }
}
