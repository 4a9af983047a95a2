//! In-memory session backend with an LRU cap so long-running demos do not
//! accumulate unbounded history.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use super::{SessionStore, Turn};

pub struct InMemorySessionStore {
    sessions: Mutex<LruCache<String, Vec<Turn>>>,
}

impl InMemorySessionStore {
    pub fn new(max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn append_turn(&self, session_id: &str, turn: Turn) -> anyhow::Result<()> {
        let mut sessions = self.sessions.lock();
        if sessions.len() == usize::from(sessions.cap()) && !sessions.contains(session_id) {
            if let Some((evicted, _)) = sessions.peek_lru() {
                tracing::debug!("session cap reached, evicting least recent session '{evicted}'");
            }
        }
        sessions
            .get_or_insert_mut(session_id.to_string(), Vec::new)
            .push(turn);
        Ok(())
    }

    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<Turn>> {
        // `get` also marks the session as recently used, so active reads
        // keep a session out of eviction.
        Ok(self
            .sessions
            .lock()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn appends_accumulate_in_order() {
        let store = InMemorySessionStore::new(16);
        store.append_turn("s1", Turn::user("hola")).await.unwrap();
        store
            .append_turn("s1", Turn::assistant("buenas"))
            .await
            .unwrap();
        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Turn::user("hola"));
        assert_eq!(history[1], Turn::assistant("buenas"));
    }

    #[tokio::test]
    async fn unknown_session_has_empty_history() {
        let store = InMemorySessionStore::new(4);
        assert!(store.history("nope").await.unwrap().is_empty());
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new(4);
        store.append_turn("a", Turn::user("uno")).await.unwrap();
        store.append_turn("b", Turn::user("dos")).await.unwrap();
        assert_eq!(store.history("a").await.unwrap().len(), 1);
        assert_eq!(store.history("b").await.unwrap().len(), 1);
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn least_recent_session_is_evicted_at_capacity() {
        let store = InMemorySessionStore::new(2);
        store.append_turn("a", Turn::user("1")).await.unwrap();
        store.append_turn("b", Turn::user("2")).await.unwrap();
        store.append_turn("c", Turn::user("3")).await.unwrap();
        assert_eq!(store.session_count(), 2);
        assert!(store.history("a").await.unwrap().is_empty());
        assert_eq!(store.history("c").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reading_a_session_protects_it_from_eviction() {
        let store = InMemorySessionStore::new(2);
        store.append_turn("a", Turn::user("1")).await.unwrap();
        store.append_turn("b", Turn::user("2")).await.unwrap();
        let _ = store.history("a").await.unwrap();
        store.append_turn("c", Turn::user("3")).await.unwrap();
        assert_eq!(store.history("a").await.unwrap().len(), 1);
        assert!(store.history("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_to_one_session_all_land() {
        let store = Arc::new(InMemorySessionStore::new(8));
        let mut handles = Vec::new();
        for i in 0..4 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_turn("shared", Turn::user(format!("turno {i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.history("shared").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn zero_capacity_still_keeps_one_session() {
        let store = InMemorySessionStore::new(0);
        store.append_turn("a", Turn::user("1")).await.unwrap();
        assert_eq!(store.history("a").await.unwrap().len(), 1);
    }
}
