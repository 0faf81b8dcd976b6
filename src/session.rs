// Explicit session state, passed through the call chain instead of living
// in process-wide flags: who is logged in, and which rows are in edit mode.

use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    LoggedOut,
    LoggedIn,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    auth: AuthState,
    /// Record id -> edit-mode flag
    editing: HashMap<Uuid, bool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth == AuthState::LoggedIn
    }

    /// Logging out also drops all in-flight edits; a fresh login starts
    /// from a clean slate.
    pub(crate) fn set_auth(&mut self, state: AuthState) {
        self.auth = state;
        if state == AuthState::LoggedOut {
            self.editing.clear();
        }
    }

    pub fn is_editing(&self, id: Uuid) -> bool {
        self.editing.get(&id).copied().unwrap_or(false)
    }

    pub fn set_editing(&mut self, id: Uuid, editing: bool) {
        if editing {
            self.editing.insert(id, true);
        } else {
            self.editing.remove(&id);
        }
    }

    pub fn clear_editing(&mut self, id: Uuid) {
        self.editing.remove(&id);
    }

    pub fn editing_count(&self) -> usize {
        self.editing.values().filter(|&&on| on).count()
    }
}
