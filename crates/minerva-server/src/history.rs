//! Keyed conversation-history persistence.
//!
//! The orchestrator never touches storage itself; transports load the
//! history before a turn and persist the returned extension afterwards.
//! Concurrent turns for the same key are last-write-wins; there is no
//! per-key locking here.

use std::collections::HashMap;

use async_trait::async_trait;
use minerva_ai::History;
use tokio::sync::RwLock;

/// Keyed get/set of conversation history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the stored history, or an empty one when absent.
    async fn get(&self, key: &str) -> History;

    /// Replaces the stored history for `key`.
    async fn set(&self, key: &str, history: History);

    /// Removes the key entirely.
    async fn clear(&self, key: &str);
}

/// In-process history store.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<String, History>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get(&self, key: &str) -> History {
        self.entries.read().await.get(key).cloned().unwrap_or_default()
    }

    async fn set(&self, key: &str, history: History) {
        self.entries.write().await.insert(key.to_string(), history);
    }

    async fn clear(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerva_ai::{Content, Part};

    #[tokio::test]
    async fn absent_key_yields_empty_history() {
        let store = MemoryHistoryStore::new();
        assert!(store.get("chat:1").await.is_empty());
    }

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = MemoryHistoryStore::new();
        let history = vec![Content::user(vec![Part::text("hello")])];

        store.set("chat:1", history.clone()).await;
        let loaded = store.get("chat:1").await;

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].leading_text(), Some("hello"));
        // Other keys stay independent.
        assert!(store.get("chat:2").await.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_key() {
        let store = MemoryHistoryStore::new();
        store
            .set("chat:1", vec![Content::user(vec![Part::text("hi")])])
            .await;
        store.clear("chat:1").await;
        assert!(store.get("chat:1").await.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_previous_history() {
        let store = MemoryHistoryStore::new();
        store
            .set("chat:1", vec![Content::user(vec![Part::text("old")])])
            .await;
        store
            .set(
                "chat:1",
                vec![
                    Content::user(vec![Part::text("old")]),
                    Content::user(vec![Part::text("new")]),
                ],
            )
            .await;
        assert_eq!(store.get("chat:1").await.len(), 2);
    }
}
