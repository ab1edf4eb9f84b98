//! One-shot notices ("flash messages") queued per session and shown on the
//! next rendered page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

/// In-memory message queues keyed by session id.
#[derive(Clone, Debug, Default)]
pub struct FlashStore {
    queues: Arc<Mutex<HashMap<Uuid, Vec<Message>>>>,
}

impl FlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, session: Uuid, level: Level, text: impl Into<String>) {
        let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
        queues.entry(session).or_default().push(Message {
            level,
            text: text.into(),
        });
    }

    /// Take every queued message for a session, oldest first.
    pub fn drain(&self, session: Uuid) -> Vec<Message> {
        let mut queues = self.queues.lock().unwrap_or_else(|e| e.into_inner());
        queues.remove(&session).unwrap_or_default()
    }

    pub fn pending_sessions(&self) -> usize {
        self.queues.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_messages_in_order_once() {
        let store = FlashStore::new();
        let session = Uuid::new_v4();
        store.push(session, Level::Info, "first");
        store.push(session, Level::Success, "second");

        let drained = store.drain(session);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].text, "first");
        assert_eq!(drained[1].level, Level::Success);

        assert!(store.drain(session).is_empty());
        assert_eq!(store.pending_sessions(), 0);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = FlashStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.push(a, Level::Info, "for a");

        assert!(store.drain(b).is_empty());
        assert_eq!(store.drain(a).len(), 1);
    }
}
