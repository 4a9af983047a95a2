//! Free-form consultation endpoints with archived reports.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::prompt;
use crate::providers::GenerationOptions;
use crate::reports::{self, ConsultationReport};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

#[derive(Default, Deserialize)]
pub struct ConsultationRequest {
    #[serde(default)]
    consulta: String,
}

#[derive(Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    consulta: String,
    #[serde(default)]
    respuesta: String,
}

pub async fn submit_consultation(State(state): State<AppState>, body: Bytes) -> Response {
    let request = serde_json::from_slice::<ConsultationRequest>(&body).unwrap_or_default();
    if request.consulta.is_empty() {
        return ApiError::bad_request("No se proporcionó consulta").into_response();
    }

    let tuning = &state.config.generative;
    let options = GenerationOptions::tuned(tuning.reply_temperature, tuning.reply_max_tokens);
    let respuesta = match state
        .generator
        .generate(&prompt::consultation(&request.consulta), &options)
        .await
    {
        Ok(text) => text,
        Err(err) => {
            tracing::error!("consultation generation failed: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": format!("Error al procesar consulta: {err}"),
                    "tipo_error": "upstream_error",
                })),
            )
                .into_response();
        }
    };

    let report = build_report(&state, &request.consulta, &respuesta).await;
    let timestamp = report.timestamp.clone();
    Json(json!({
        "respuesta": respuesta,
        "reporte": report,
        "timestamp": timestamp,
    }))
    .into_response()
}

pub async fn generate_report(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let request = serde_json::from_slice::<ReportRequest>(&body).unwrap_or_default();
    let report = build_report(&state, &request.consulta, &request.respuesta).await;
    Json(json!({ "reporte": report }))
}

pub async fn consultation_history(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let reportes = state.reports.recent().await?;
    Ok(Json(json!({ "reportes": reportes })))
}

/// Derives the structured report for a consultation. Generation failures
/// fall back to a basic report instead of erroring, and archive failures
/// only log: the caller always gets a report document.
async fn build_report(state: &AppState, consulta: &str, respuesta: &str) -> ConsultationReport {
    let tuning = &state.config.generative;
    let options = GenerationOptions::tuned(tuning.report_temperature, tuning.report_max_tokens);
    let analisis = match state
        .generator
        .generate(&prompt::report(consulta, respuesta), &options)
        .await
    {
        Ok(text) => reports::reshape_report_analysis(&text),
        Err(err) => {
            tracing::warn!("report generation failed: {err}");
            reports::fallback_analysis(&err)
        }
    };

    let report = ConsultationReport::new(consulta, respuesta, analisis);
    if let Err(err) = state.reports.save(&report).await {
        tracing::warn!("failed to archive report: {err}");
    }
    report
}
