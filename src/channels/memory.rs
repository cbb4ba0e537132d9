//! In-memory sink that records deliveries instead of sending them.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::channels::MessageSink;
use crate::error::ChannelError;
use crate::identity::UserIdentity;

/// Records every delivered message; optionally fails for chosen recipients.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(UserIdentity, String)>>,
    failing: Mutex<HashSet<UserIdentity>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to `user` fail from now on.
    pub fn fail_for(&self, user: UserIdentity) {
        self.failing.lock().unwrap_or_else(|e| e.into_inner()).insert(user);
    }

    /// All successful deliveries, in order.
    pub fn sent(&self) -> Vec<(UserIdentity, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts delivered to `user`, in order.
    pub fn sent_to(&self, user: UserIdentity) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send_message(&self, to: UserIdentity, text: &str) -> Result<(), ChannelError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&to)
        {
            return Err(ChannelError::SendFailed {
                name: "memory".into(),
                reason: format!("delivery to {to} disabled"),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((to, text.to_string()));
        Ok(())
    }
}
