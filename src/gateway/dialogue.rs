//! Memory-backed patient dialogue and the end-of-session conclusion.

use axum::{Json, body::Bytes, extract::State, response::Response};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::prompt;
use crate::providers::GenerationOptions;
use crate::session::{DEFAULT_SESSION_ID, Turn, render_context};
use crate::wire;

use super::error::{ApiError, ApiResult};
use super::reply::{MALFORMED_XML_MSG, xml_error, xml_response};
use super::state::AppState;

#[derive(Default, Deserialize)]
pub struct InteractionRequest {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: String,
    /// Context turns supplied by the client. Only this variant trusts the
    /// caller's view of the conversation; the tag-based variant replays the
    /// server-side ledger instead.
    #[serde(default)]
    history: Vec<Turn>,
}

#[derive(Default, Deserialize)]
pub struct ConclusionRequest {
    #[serde(default)]
    session_id: Option<String>,
}

pub async fn interaction(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let request = serde_json::from_slice::<InteractionRequest>(&body).unwrap_or_default();
    if request.message.is_empty() {
        return Err(ApiError::bad_request("Falta 'message'"));
    }
    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    state
        .sessions
        .append_turn(&session_id, Turn::user(request.message.clone()))
        .await?;

    let note = prompt::dialogue(&render_context(&request.history), &request.message);
    let answer = state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await?;
    state
        .sessions
        .append_turn(&session_id, Turn::assistant(answer.clone()))
        .await?;
    let summary = summarize(&state, &answer).await;

    Ok(Json(json!({
        "session_id": session_id,
        "response": answer,
        "summary": summary,
    })))
}

pub async fn interaction_xml(State(state): State<AppState>, body: Bytes) -> Response {
    let doc = match wire::decode(&body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!("rejected interaction body: {err}");
            return xml_error(MALFORMED_XML_MSG);
        }
    };
    let message = doc.text("message").unwrap_or_default().trim().to_string();
    if message.is_empty() {
        return xml_error("Falta <message> en XML");
    }
    let session_id = doc
        .text("session_id")
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string();

    match run_interaction(&state, &session_id, &message).await {
        Ok((answer, summary)) => xml_response(&[
            ("session_id", session_id),
            ("response", answer),
            ("summary", summary),
        ]),
        Err(err) => xml_error(err.to_string()),
    }
}

async fn run_interaction(
    state: &AppState,
    session_id: &str,
    message: &str,
) -> anyhow::Result<(String, String)> {
    state
        .sessions
        .append_turn(session_id, Turn::user(message))
        .await?;

    // Context is everything before the turn just recorded.
    let history = state.sessions.history(session_id).await?;
    let prior = &history[..history.len().saturating_sub(1)];
    let note = prompt::dialogue_continued(&render_context(prior), message);

    let answer = state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await?;
    state
        .sessions
        .append_turn(session_id, Turn::assistant(answer.clone()))
        .await?;
    let summary = summarize(state, &answer).await;
    Ok((answer, summary))
}

async fn summarize(state: &AppState, answer: &str) -> String {
    match state
        .generator
        .generate(&prompt::summary_note(answer), &GenerationOptions::default())
        .await
    {
        Ok(summary) => summary,
        Err(err) => format!("(Error al resumir: {err})"),
    }
}

pub async fn conclusion(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let request = serde_json::from_slice::<ConclusionRequest>(&body).unwrap_or_default();
    let session_id = request
        .session_id
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string());

    let history = state.sessions.history(&session_id).await?;
    let note = prompt::conclusion(&history)
        .map_err(|_| ApiError::bad_request("No hay historial para esta sesión"))?;
    let text = state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await?;

    Ok(Json(json!({
        "session_id": session_id,
        "conclusion": text,
    })))
}

pub async fn conclusion_xml(State(state): State<AppState>, body: Bytes) -> Response {
    let doc = match wire::decode(&body) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!("rejected conclusion body: {err}");
            return xml_error(MALFORMED_XML_MSG);
        }
    };
    let session_id = doc
        .text("session_id")
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string();

    let history = match state.sessions.history(&session_id).await {
        Ok(history) => history,
        Err(err) => return xml_error(err.to_string()),
    };
    let Ok(note) = prompt::conclusion(&history) else {
        return xml_error("No hay historial para esta sesión");
    };
    match state
        .generator
        .generate(&note, &GenerationOptions::default())
        .await
    {
        Ok(text) => xml_response(&[("session_id", session_id), ("conclusion", text)]),
        Err(err) => xml_error(err.to_string()),
    }
}
