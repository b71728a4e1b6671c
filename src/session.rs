//! Per-user installed tool sets
//!
//! The session store tracks which tools each user has approved for execution.
//! It holds only identifiers: a stored id whose record has dropped out of the
//! registry cache is still valid ("installed but not cached"). Sets are
//! created lazily on first reference and are mutated only by the engine after
//! a successful install or uninstall outcome.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Shared store of per-user installed tool ids
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl SessionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the user's installed set (empty if never seen)
    pub fn get(&self, user_id: &str) -> HashSet<String> {
        self.sessions
            .read()
            .ok()
            .and_then(|s| s.get(user_id).cloned())
            .unwrap_or_default()
    }

    /// Marks a tool installed for the user
    pub fn add(&self, user_id: &str, tool_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions
                .entry(user_id.to_string())
                .or_default()
                .insert(tool_id.to_string());
        }
    }

    /// Removes a tool from the user's set. Returns true if it was present.
    pub fn remove(&self, user_id: &str, tool_id: &str) -> bool {
        if let Ok(mut sessions) = self.sessions.write() {
            if let Some(set) = sessions.get_mut(user_id) {
                return set.remove(tool_id);
            }
        }
        false
    }

    /// True if the user has the tool installed
    pub fn is_installed(&self, user_id: &str, tool_id: &str) -> bool {
        self.sessions
            .read()
            .map(|s| {
                s.get(user_id)
                    .map(|set| set.contains(tool_id))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Number of users with at least one interaction
    pub fn user_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}
