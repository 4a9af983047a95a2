//! Liveness, diagnostics, and the generative connectivity probe.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use super::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Consulta Médica Virtual API funcionando",
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let components: serde_json::Map<String, Value> = crate::health::snapshot()
        .components
        .into_iter()
        .map(|(name, backend)| (name, Value::String(backend.state.as_str().to_string())))
        .collect();
    let reports_count = match state.reports.count().await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!("failed to count reports: {err}");
            0
        }
    };

    Json(json!({
        "status": "running",
        "did_api_key": configured_flag(state.avatar.api_key.is_some()),
        "did_agent_id": configured_flag(state.avatar.agent_id.is_some()),
        "did_client_key": configured_flag(state.avatar.client_key.is_some()),
        "sessions_count": state.sessions.session_count(),
        "reports_count": reports_count,
        "uptime_seconds": crate::health::uptime_seconds(),
        "components": components,
    }))
}

fn configured_flag(present: bool) -> &'static str {
    if present { "configured" } else { "missing" }
}

pub async fn probe_generator(State(state): State<AppState>) -> Response {
    let key = state
        .config
        .generative
        .api_key
        .clone()
        .filter(|key| !key.is_empty());
    let Some(key) = key else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "GOOGLE_GEMINI_API_KEY no está configurada",
                "solucion": "Configura GOOGLE_GEMINI_API_KEY en las variables de entorno de Vercel",
            })),
        )
            .into_response();
    };

    match state.generator.warmup().await {
        Ok(respuesta) => {
            crate::health::mark_ok("generative");
            Json(json!({
                "status": "success",
                "message": "Conexión con Gemini exitosa",
                "respuesta": respuesta,
                "api_key_preview": api_key_preview(&key),
            }))
            .into_response()
        }
        Err(err) => {
            crate::health::mark_error("generative", &err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": err.to_string(),
                    "tipo_error": "upstream_error",
                })),
            )
                .into_response()
        }
    }
}

/// Enough of the key to recognize it, never the whole thing.
fn api_key_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "key muy corta".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_masks_the_middle() {
        assert_eq!(api_key_preview("AIzaSyABCDEF123456789xyz"), "AIzaSyAB...9xyz");
    }

    #[test]
    fn short_keys_are_not_previewed() {
        assert_eq!(api_key_preview("tiny"), "key muy corta");
    }
}
