//! Bounded conversation history, keyed by session.
//!
//! Each key holds its own ordered turn list with the same append+trim
//! contract; callers without a session fall back to one shared key, which
//! preserves the single-global-timeline behavior for anonymous requests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::ConversationTurn;

/// Retained turns per session after trimming.
pub const MAX_TURNS: usize = 10;

/// Session key used when the caller supplies no uid/session.
pub const SHARED_SESSION: &str = "global";

#[derive(Debug, Default)]
pub struct ConversationStore {
    sessions: Mutex<HashMap<String, Vec<ConversationTurn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<ConversationTurn>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a session's history, oldest first.
    pub fn history(&self, key: &str) -> Vec<ConversationTurn> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn push_user(&self, key: &str, text: impl Into<String>) {
        self.push(key, ConversationTurn::user(text));
    }

    /// Append an assistant turn, then trim the session to the cap.
    pub fn push_assistant(&self, key: &str, text: impl Into<String>) {
        self.push(key, ConversationTurn::assistant(text));
        self.trim(key);
    }

    fn push(&self, key: &str, turn: ConversationTurn) {
        self.lock().entry(key.to_string()).or_default().push(turn);
    }

    /// Discard the oldest turns beyond [`MAX_TURNS`], keeping order.
    fn trim(&self, key: &str) {
        let mut sessions = self.lock();
        if let Some(turns) = sessions.get_mut(key) {
            let excess = turns.len().saturating_sub(MAX_TURNS);
            if excess > 0 {
                turns.drain(..excess);
            }
        }
    }

    pub fn turn_count(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[test]
    fn appends_preserve_order() {
        let store = ConversationStore::new();
        store.push_user("s1", "first");
        store.push_assistant("s1", "second");

        let history = store.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "first");
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[test]
    fn trim_keeps_the_most_recent_turns() {
        let store = ConversationStore::new();
        for i in 0..15 {
            store.push_user("s1", format!("q{i}"));
            store.push_assistant("s1", format!("a{i}"));
        }

        let history = store.history("s1");
        assert_eq!(history.len(), MAX_TURNS);
        // Most recent turns, original order.
        assert_eq!(history.last().map(|t| t.text.as_str()), Some("a14"));
        assert_eq!(history.first().map(|t| t.text.as_str()), Some("q10"));
    }

    #[test]
    fn count_never_exceeds_cap_after_assistant_append() {
        let store = ConversationStore::new();
        for i in 0..100 {
            store.push_user("s1", format!("u{i}"));
            store.push_assistant("s1", format!("b{i}"));
            assert!(store.turn_count("s1") <= MAX_TURNS);
        }
    }

    #[test]
    fn sessions_are_isolated() {
        let store = ConversationStore::new();
        store.push_user("alice", "hello");
        store.push_user(SHARED_SESSION, "anonymous");

        assert_eq!(store.turn_count("alice"), 1);
        assert_eq!(store.turn_count(SHARED_SESSION), 1);
        assert_eq!(store.turn_count("bob"), 0);
    }

    #[test]
    fn unknown_session_has_empty_history() {
        let store = ConversationStore::new();
        assert!(store.history("nobody").is_empty());
    }
}
