//! Conversation ledger: per-session turn history behind a storage trait so
//! the gateway never touches a concrete backend directly.

pub mod memory;
pub mod types;

pub use memory::InMemorySessionStore;
pub use types::{render_context, Role, Turn};

use async_trait::async_trait;

use crate::config::SessionConfig;

/// Session id used when a request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Conversation storage backend.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Appends one turn to a session, creating the session on first use.
    async fn append_turn(&self, session_id: &str, turn: Turn) -> anyhow::Result<()>;

    /// Snapshot of a session's turns in append order. Unknown sessions
    /// yield an empty history.
    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<Turn>>;

    /// Number of sessions currently retained.
    fn session_count(&self) -> usize;
}

/// Factory: create the right session backend from config
pub fn create_session_store(config: &SessionConfig) -> Box<dyn SessionStore> {
    match config.backend.as_str() {
        "memory" => Box::new(InMemorySessionStore::new(config.max_sessions)),
        other => {
            tracing::warn!("Unknown session backend '{other}', falling back to in-memory");
            Box::new(InMemorySessionStore::new(config.max_sessions))
        }
    }
}
