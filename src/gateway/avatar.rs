//! Avatar vendor passthrough endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::providers::AgentsReply;

use super::error::ApiError;
use super::state::AppState;

pub async fn list_agents(State(state): State<AppState>) -> Response {
    if !state.avatar.is_configured() {
        return ApiError::internal("D-ID API Key no configurada").into_response();
    }

    match state.avatar.list_agents().await {
        Ok(AgentsReply::Listed(agents)) => {
            let total = agents.len();
            Json(json!({
                "status": "success",
                "agents": agents,
                "total": total,
            }))
            .into_response()
        }
        // The vendor's failure keeps its original status so the front end
        // can tell quota errors from auth errors.
        Ok(AgentsReply::Failed { status, body }) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Json(json!({
                    "error": format!("D-ID API error: {status}"),
                    "message": body,
                })),
            )
                .into_response()
        }
        Err(err) => ApiError::internal(err.to_string()).into_response(),
    }
}

pub async fn client_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.avatar.readiness())
}
