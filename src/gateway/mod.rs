//! HTTP surface of the assistant: route table, server loop, shutdown.

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod avatar;
mod clinical;
mod consults;
mod dialogue;
mod error;
mod files;
mod reply;
mod speech;
mod state;
mod system;
mod upload;
mod voice;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let max_body = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(system::health))
        .route("/api/status", get(system::status))
        .route("/api/test-gemini", get(system::probe_generator))
        .route("/api/ai/doctor", post(clinical::doctor_note))
        .route("/api/ai/patient", post(clinical::patient_message))
        .route("/api/ai/file/analyze_json", post(files::analyze_json))
        .route("/api/ai/file/analyze_xml", post(files::analyze_xml))
        .route("/api/ai/text-to-speech", post(speech::text_to_speech))
        .route("/api/ai/text-to-speech-xml", post(speech::text_to_speech_xml))
        .route("/api/ai/speech-to-text", post(speech::speech_to_text))
        .route("/api/ai/speech-to-text-xml", post(speech::speech_to_text_xml))
        .route("/api/ai/interaction", post(dialogue::interaction))
        .route("/api/ai/interaction-xml", post(dialogue::interaction_xml))
        .route("/api/ai/conclusion", post(dialogue::conclusion))
        .route("/api/ai/conclusion-xml", post(dialogue::conclusion_xml))
        .route("/api/ai/voice-session", post(voice::voice_session))
        .route("/api/ai/voice-session-xml", post(voice::voice_session_xml))
        .route("/media/{name}", get(speech::fetch_media))
        .route("/api/consulta", post(consults::submit_consultation))
        .route("/api/generar-reporte", post(consults::generate_report))
        .route("/api/historial", get(consults::consultation_history))
        .route("/api/did/agents", get(avatar::list_agents))
        .route("/api/did/config", get(avatar::client_config))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn run(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on http://{addr}");
    crate::health::mark_ok("gateway");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    // A signal handler that cannot be installed must never resolve, or the
    // server would shut down right after starting.
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
