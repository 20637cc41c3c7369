//! Browser-session key-value storage.

use std::collections::HashMap;

/// Session flag: `"true"` when an administrator is logged in.
pub const SESSION_AUTHENTICATED: &str = "authenticated";
pub const SESSION_USERNAME: &str = "username";
pub const SESSION_USER_EMOJI: &str = "userEmoji";
pub const SESSION_USER_ID: &str = "userId";
/// Session flag: `"true"` while a view-once window is open.
pub const SESSION_VIEW_ONLY: &str = "viewOnly";
/// Epoch milliseconds when the current view-once window opened.
pub const SESSION_VIEW_ONLY_START: &str = "viewOnlyStartTime";

pub(crate) const FLAG_TRUE: &str = "true";

/// Key-value storage living as long as one browser session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);

    fn flag(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some(FLAG_TRUE)
    }
}

/// In-process session storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
