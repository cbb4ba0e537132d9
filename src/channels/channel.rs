//! Transport-facing types: inbound messages and the outbound primitive.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;
use crate::identity::UserIdentity;

/// A text message received from a chat participant.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced this message.
    pub channel: String,
    pub sender: UserIdentity,
    /// Display name, if the transport knows one.
    pub user_name: Option<String>,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(
        channel: impl Into<String>,
        sender: UserIdentity,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            sender,
            user_name: None,
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}

/// Stream of inbound messages from a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// The sole outbound primitive: deliver `text` to `to`.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_message(&self, to: UserIdentity, text: &str) -> Result<(), ChannelError>;
}

/// A bidirectional chat transport.
#[async_trait]
pub trait Channel: MessageSink {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

/// Deliver `text`, logging instead of failing. Outbound delivery is
/// fire-and-forget from the dialog's point of view.
pub async fn deliver(sink: &dyn MessageSink, to: UserIdentity, text: &str) -> bool {
    match sink.send_message(to, text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(user = %to, error = %e, "Message delivery failed");
            false
        }
    }
}
