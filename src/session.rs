//! Per-session conversation memory.
//!
//! Sessions hold recent question/answer exchanges so follow-up queries
//! carry context. History is capped: only the most recent exchanges
//! survive, older ones fall off.

use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// How many exchanges a session keeps by default.
pub const DEFAULT_MAX_HISTORY: usize = 2;

/// One completed question/answer pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// In-memory session registry.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Vec<Exchange>>>,
    max_history: usize,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history: DEFAULT_MAX_HISTORY,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Create a fresh session and return its id.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap()
            .insert(id.clone(), Vec::new());
        debug!(session = %id, "created session");
        id
    }

    /// Record a completed exchange. Unknown session ids are created on
    /// first use.
    pub fn add_exchange(&self, session_id: &str, question: &str, answer: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Exchange {
            question: question.to_string(),
            answer: answer.to_string(),
        });

        let excess = history.len().saturating_sub(self.max_history);
        if excess > 0 {
            history.drain(..excess);
        }
    }

    /// Render a session's history for prompt injection, oldest exchange
    /// first. `None` when the session is unknown or empty.
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap();
        let history = sessions.get(session_id)?;
        if history.is_empty() {
            return None;
        }

        let rendered = history
            .iter()
            .map(|exchange| {
                format!(
                    "User: {}\nAssistant: {}",
                    exchange.question, exchange.answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(rendered)
    }

    /// Forget a session entirely.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
        debug!(session = session_id, "cleared session");
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_sessions_have_unique_ids() {
        let manager = SessionManager::new();
        let a = manager.create_session();
        let b = manager.create_session();

        assert!(!a.is_empty());
        assert_ne!(a, b);
        assert_eq!(manager.session_count(), 2);
    }

    #[test]
    fn test_history_renders_user_assistant_pairs() {
        let manager = SessionManager::new();
        let id = manager.create_session();

        manager.add_exchange(&id, "What is MCP?", "A protocol for tool access.");
        manager.add_exchange(&id, "Who made it?", "Anthropic.");

        let history = manager.get_history(&id).unwrap();
        assert_eq!(
            history,
            "User: What is MCP?\nAssistant: A protocol for tool access.\n\n\
             User: Who made it?\nAssistant: Anthropic."
        );
    }

    #[test]
    fn test_history_keeps_only_most_recent_exchanges() {
        let manager = SessionManager::new();
        let id = manager.create_session();

        manager.add_exchange(&id, "first", "1");
        manager.add_exchange(&id, "second", "2");
        manager.add_exchange(&id, "third", "3");

        let history = manager.get_history(&id).unwrap();
        assert!(!history.contains("first"));
        assert!(history.contains("second"));
        assert!(history.contains("third"));
    }

    #[test]
    fn test_unknown_or_empty_session_has_no_history() {
        let manager = SessionManager::new();
        assert_eq!(manager.get_history("missing"), None);

        let id = manager.create_session();
        assert_eq!(manager.get_history(&id), None);
    }

    #[test]
    fn test_exchange_creates_session_on_first_use() {
        let manager = SessionManager::new();
        manager.add_exchange("walk-in", "q", "a");

        assert!(manager.get_history("walk-in").unwrap().contains("User: q"));
    }

    #[test]
    fn test_clear_forgets_session() {
        let manager = SessionManager::new();
        let id = manager.create_session();
        manager.add_exchange(&id, "q", "a");

        manager.clear_session(&id);
        assert_eq!(manager.get_history(&id), None);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let manager = SessionManager::new();
        let a = manager.create_session();
        let b = manager.create_session();

        manager.add_exchange(&a, "question a", "answer a");
        manager.add_exchange(&b, "question b", "answer b");

        assert!(!manager.get_history(&a).unwrap().contains("question b"));
        assert!(!manager.get_history(&b).unwrap().contains("question a"));
    }
}
