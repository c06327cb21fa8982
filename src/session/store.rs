//! Bounded in-memory session store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One (query, answer) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// What the user asked.
    pub query: String,
    /// What the assistant answered.
    pub answer: String,
}

/// Holds capped exchange history per session id.
///
/// Safe to share across tasks. Concurrent queries against the *same*
/// session id race on read-then-append; callers keep at most one query in
/// flight per session.
#[derive(Debug)]
pub struct SessionStore {
    max_history: usize,
    sessions: Mutex<HashMap<String, VecDeque<Exchange>>>,
    counter: AtomicU64,
}

impl SessionStore {
    /// Creates a store keeping at most `max_history` exchanges per session.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Retention window `N`.
    #[must_use]
    pub const fn max_history(&self) -> usize {
        self.max_history
    }

    /// Mints a fresh session id (`session_1`, `session_2`, ...).
    ///
    /// The returned session always starts empty, even if the id was already
    /// written through [`add_exchange`](Self::add_exchange).
    pub fn create_session(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("session_{n}");
        self.lock().insert(id.clone(), VecDeque::new());
        id
    }

    /// Renders the session's exchanges oldest-to-newest.
    ///
    /// Returns `None` for unseen sessions and sessions with no exchanges.
    #[must_use]
    pub fn get_history(&self, session_id: &str) -> Option<String> {
        let sessions = self.lock();
        let exchanges = sessions.get(session_id)?;
        if exchanges.is_empty() {
            return None;
        }
        let rendered: Vec<String> = exchanges
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.query, e.answer))
            .collect();
        Some(rendered.join("\n"))
    }

    /// Appends an exchange, evicting the oldest ones beyond the window.
    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) {
        let mut sessions = self.lock();
        let exchanges = sessions.entry(session_id.to_string()).or_default();
        exchanges.push_back(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });
        while exchanges.len() > self.max_history {
            exchanges.pop_front();
        }
    }

    /// Exchanges currently held for a session, oldest first.
    #[must_use]
    pub fn exchanges(&self, session_id: &str) -> Vec<Exchange> {
        self.lock()
            .get(session_id)
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Forgets a session and its history.
    pub fn clear_session(&self, session_id: &str) {
        self.lock().remove(session_id);
    }

    /// Number of sessions seen so far.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Exchange>>> {
        // Every mutation leaves the map consistent, so a poisoned lock is safe to reuse.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
