//! Session store: one live dialog per user identity.
//!
//! Entries are created by `/start` and removed on completion or `/cancel`.
//! Every mutation of an entry happens inside a single write section, so a
//! read-modify-write step for one identity is atomic with respect to all
//! other callers. Sessions never interact, so no cross-identity ordering is
//! provided or needed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::identity::UserIdentity;

use super::model::RequestDraft;
use super::state::ConversationState;

/// A live dialog: current step plus the partially filled draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserIdentity,
    pub state: ConversationState,
    pub draft: RequestDraft,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session awaiting the first field.
    pub fn new(user: UserIdentity) -> Self {
        Self {
            user,
            state: ConversationState::INITIAL,
            draft: RequestDraft::new(),
            started_at: Utc::now(),
        }
    }
}

/// In-memory map of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<UserIdentity, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session for `user`, returning any session it replaced.
    pub async fn create(&self, user: UserIdentity) -> Option<Session> {
        let replaced = self.sessions.write().await.insert(user, Session::new(user));
        if let Some(ref old) = replaced {
            debug!(user = %user, state = %old.state, "Discarded in-flight session on re-entry");
        }
        replaced
    }

    /// Snapshot of the session for `user`.
    pub async fn get(&self, user: UserIdentity) -> Option<Session> {
        self.sessions.read().await.get(&user).cloned()
    }

    /// Current state for `user`; `None` means no session.
    pub async fn state_of(&self, user: UserIdentity) -> Option<ConversationState> {
        self.sessions.read().await.get(&user).map(|s| s.state)
    }

    /// Remove and return the session for `user`.
    pub async fn remove(&self, user: UserIdentity) -> Option<Session> {
        self.sessions.write().await.remove(&user)
    }

    /// Run `f` against the entry for `user` under the write lock.
    ///
    /// `f` sees `None` when no session exists. Leaving `Some` in the slot
    /// stores it; leaving `None` removes the entry.
    pub async fn with_entry<R>(
        &self,
        user: UserIdentity,
        f: impl FnOnce(&mut Option<Session>) -> R,
    ) -> R {
        let mut sessions = self.sessions.write().await;
        let mut slot = sessions.remove(&user);
        let out = f(&mut slot);
        if let Some(session) = slot {
            sessions.insert(user, session);
        }
        out
    }

    pub async fn contains(&self, user: UserIdentity) -> bool {
        self.sessions.read().await.contains_key(&user)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
