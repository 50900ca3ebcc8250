//! Per-session conversation history

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Role, Turn};

/// In-memory conversation store keyed by session id
///
/// Sessions are created lazily on first access and live until
/// [`SessionStore::clear_all`]. Each entry is guarded by its own shard lock,
/// so concurrent requests on different sessions never contend.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Vec<Turn>>,
    max_turns: Option<usize>,
    /// Bumped by every `clear_all`
    epoch: AtomicU64,
}

impl SessionStore {
    /// Create an unbounded store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that keeps at most `max_turns` turns per session
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns,
            epoch: AtomicU64::new(0),
        }
    }

    /// Snapshot of a session's history, registering it if unseen
    pub fn get_or_create(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Append a single turn
    pub fn append(&self, session_id: &str, role: Role, text: impl Into<String>) {
        let mut history = self.sessions.entry(session_id.to_string()).or_default();
        history.push(Turn {
            role,
            content: text.into(),
        });
        self.enforce_cap(&mut history);
    }

    /// Append a question and its answer together
    pub fn append_exchange(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut history = self.sessions.entry(session_id.to_string()).or_default();
        history.push(Turn::user(user_text));
        history.push(Turn::assistant(assistant_text));
        self.enforce_cap(&mut history);
    }

    /// Current reset generation; pass it back to [`SessionStore::append_exchange_since`]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Append an exchange only if no `clear_all` happened since `epoch` was read
    ///
    /// Returns false when the exchange was discarded.
    pub fn append_exchange_since(
        &self,
        epoch: u64,
        session_id: &str,
        user_text: &str,
        assistant_text: &str,
    ) -> bool {
        // The shard lock is held from here on, so a concurrent clear cannot
        // slip between the check and the push.
        let entry = self.sessions.entry(session_id.to_string());
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        let mut history = entry.or_default();
        history.push(Turn::user(user_text));
        history.push(Turn::assistant(assistant_text));
        self.enforce_cap(&mut history);
        true
    }

    /// Forget one session's history
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drop every session
    pub fn clear_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.sessions.clear();
    }

    /// Number of known sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Turns recorded for a session (0 if unseen)
    pub fn turn_count(&self, session_id: &str) -> usize {
        self.sessions
            .get(session_id)
            .map(|h| h.len())
            .unwrap_or(0)
    }

    fn enforce_cap(&self, history: &mut Vec<Turn>) {
        if let Some(max) = self.max_turns {
            if history.len() > max {
                let excess = history.len() - max;
                history.drain(..excess);
            }
        }
    }
}
