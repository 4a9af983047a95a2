//! Process-wide backend health.
//!
//! Warmup probes and the live diagnostics endpoint record marks here;
//! `GET /api/status` reads them back. The registry lives for the process,
//! so a fresh serve starts with an empty component map.

use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendState {
    Ok,
    Error,
}

impl BackendState {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendState::Ok => "ok",
            BackendState::Error => "error",
        }
    }
}

/// Latest known state of one component, replaced wholesale on every mark.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub state: BackendState,
    pub changed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub pid: u32,
    pub uptime_seconds: u64,
    pub components: BTreeMap<String, BackendHealth>,
}

struct Registry {
    started_at: Instant,
    components: Mutex<BTreeMap<String, BackendHealth>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| Registry {
        started_at: Instant::now(),
        components: Mutex::new(BTreeMap::new()),
    })
}

fn record(name: &str, state: BackendState, detail: Option<String>) {
    if let Ok(mut map) = registry().components.lock() {
        map.insert(
            name.to_string(),
            BackendHealth {
                state,
                changed_at: Utc::now().to_rfc3339(),
                detail,
            },
        );
    }
}

pub fn mark_ok(name: &str) {
    record(name, BackendState::Ok, None);
}

pub fn mark_error(name: &str, error: impl ToString) {
    record(name, BackendState::Error, Some(error.to_string()));
}

pub fn uptime_seconds() -> u64 {
    registry().started_at.elapsed().as_secs()
}

pub fn snapshot() -> HealthSnapshot {
    let components = registry()
        .components
        .lock()
        .map_or_else(|_| BTreeMap::new(), |map| map.clone());

    HealthSnapshot {
        pid: std::process::id(),
        uptime_seconds: uptime_seconds(),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_mark_wins() {
        mark_ok("generative");
        let snap = snapshot();
        let backend = snap.components.get("generative").unwrap();
        assert_eq!(backend.state, BackendState::Ok);
        assert!(backend.detail.is_none());

        mark_error("generative", "connect timeout");
        let snap = snapshot();
        let backend = snap.components.get("generative").unwrap();
        assert_eq!(backend.state, BackendState::Error);
        assert_eq!(backend.detail.as_deref(), Some("connect timeout"));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        mark_ok("gateway");
        let value = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(value["pid"], std::process::id());
        assert_eq!(value["components"]["gateway"]["state"], "ok");
    }
}
