//! Archive of structured consultation reports.
//!
//! Each free-form consultation produces a report document saved as one JSON
//! file; the history endpoint lists the most recent ones.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};

use crate::analysis::{reshape_model_output, AnalysisOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationReport {
    pub timestamp: String,
    pub consulta: String,
    pub respuesta: String,
    pub analisis: Value,
}

impl ConsultationReport {
    pub fn new(consulta: impl Into<String>, respuesta: impl Into<String>, analisis: Value) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            consulta: consulta.into(),
            respuesta: respuesta.into(),
            analisis,
        }
    }
}

/// Shapes the model's report text into the `analisis` document. Non-JSON
/// output falls back to a fixed scaffold that keeps the expected keys.
pub fn reshape_report_analysis(text: &str) -> Value {
    match reshape_model_output(text) {
        AnalysisOutcome::Structured(map) => Value::Object(map),
        AnalysisOutcome::RawText(raw) => json!({
            "resumen": raw,
            "sintomas": "Ver consulta original",
            "recomendaciones": "Ver respuesta proporcionada",
            "acciones": "Seguir recomendaciones del profesional",
            "urgencia": "Medio",
        }),
    }
}

/// Minimal `analisis` document used when report generation itself failed.
pub fn fallback_analysis(error: impl std::fmt::Display) -> Value {
    json!({
        "resumen": "Reporte básico generado",
        "error": error.to_string(),
    })
}

pub struct ReportArchive {
    dir: PathBuf,
    history_limit: usize,
}

impl ReportArchive {
    pub fn new(dir: impl Into<PathBuf>, history_limit: usize) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create reports dir {}", dir.display()))?;
        Ok(Self { dir, history_limit })
    }

    /// Writes one report file named by its creation second.
    pub async fn save(&self, report: &ConsultationReport) -> anyhow::Result<PathBuf> {
        let file_name = format!("reporte_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(file_name);
        let body = serde_json::to_vec_pretty(report).context("failed to serialize report")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(path)
    }

    /// Number of archived report files.
    pub async fn count(&self) -> anyhow::Result<usize> {
        let mut total = 0;
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to list reports dir {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(".json") {
                total += 1;
            }
        }
        Ok(total)
    }

    /// Most recent reports, newest first. Files that no longer parse are
    /// skipped rather than poisoning the whole listing.
    pub async fn recent(&self) -> anyhow::Result<Vec<Value>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to list reports dir {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") {
                names.push(name);
            }
        }
        names.sort();
        names.reverse();

        let mut reports = Vec::new();
        for name in names.into_iter().take(self.history_limit) {
            match tokio::fs::read(self.dir.join(&name)).await {
                Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                    Ok(report) => reports.push(report),
                    Err(err) => tracing::warn!("skipping unreadable report {name}: {err}"),
                },
                Err(err) => tracing::warn!("skipping unreadable report {name}: {err}"),
            }
        }
        Ok(reports)
    }
}
