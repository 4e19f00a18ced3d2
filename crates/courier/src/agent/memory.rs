//! Per-session conversational memory
//!
//! Each browser session gets its own bounded window of chat turns, keyed by
//! the opaque session identifier. Sessions idle past the configured TTL are
//! evicted lazily on the next access. Concurrent users never share a
//! buffer.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::llm::ChatMessage;

/// One completed user/assistant exchange
#[derive(Debug, Clone)]
struct Turn {
    user: String,
    assistant: String,
}

#[derive(Debug)]
struct SessionWindow {
    turns: VecDeque<Turn>,
    last_activity: Instant,
}

/// Bounded, session-keyed conversation history
#[derive(Debug)]
pub struct ConversationMemory {
    sessions: DashMap<String, SessionWindow>,
    window: usize,
    idle_ttl: Duration,
}

impl ConversationMemory {
    pub fn new(window: usize, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            window,
            idle_ttl,
        }
    }

    /// Chat history for a session, oldest turn first
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.evict_idle();
        match self.sessions.get(session_id) {
            Some(window) => window
                .turns
                .iter()
                .flat_map(|turn| {
                    [
                        ChatMessage::user(turn.user.clone()),
                        ChatMessage::assistant(turn.assistant.clone()),
                    ]
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Record a completed exchange, dropping the oldest turn beyond the
    /// window bound.
    pub fn record(&self, session_id: &str, user: String, assistant: String) {
        self.evict_idle();
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionWindow {
                turns: VecDeque::new(),
                last_activity: Instant::now(),
            });
        entry.turns.push_back(Turn { user, assistant });
        while entry.turns.len() > self.window {
            entry.turns.pop_front();
        }
        entry.last_activity = Instant::now();
    }

    /// Number of live session windows
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn evict_idle(&self) {
        let ttl = self.idle_ttl;
        self.sessions
            .retain(|_, window| window.last_activity.elapsed() <= ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> ConversationMemory {
        ConversationMemory::new(3, Duration::from_secs(3600))
    }

    #[test]
    fn test_history_empty_for_unknown_session() {
        assert!(memory().history("nobody").is_empty());
    }

    #[test]
    fn test_record_and_history_order() {
        let memory = memory();
        memory.record("s1", "first".into(), "one".into());
        memory.record("s1", "second".into(), "two".into());

        let history = memory.history("s1");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[0].content.as_deref(), Some("first"));
        assert_eq!(history[3].role, "assistant");
        assert_eq!(history[3].content.as_deref(), Some("two"));
    }

    #[test]
    fn test_window_drops_oldest_turn() {
        let memory = memory();
        for i in 0..5 {
            memory.record("s1", format!("q{i}"), format!("a{i}"));
        }

        let history = memory.history("s1");
        // Window of 3 turns = 6 messages; q0/q1 evicted
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content.as_deref(), Some("q2"));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let memory = memory();
        memory.record("alice", "hi".into(), "hello".into());

        assert!(memory.history("bob").is_empty());
        assert_eq!(memory.history("alice").len(), 2);
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let memory = ConversationMemory::new(3, Duration::ZERO);
        memory.record("s1", "q".into(), "a".into());

        // TTL of zero evicts on the next access
        assert!(memory.history("s1").is_empty());
        assert_eq!(memory.session_count(), 0);
    }
}
