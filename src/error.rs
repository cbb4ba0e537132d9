//! Error types for the intake bot.

use crate::identity::{IdentityParseError, UserIdentity};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Session error: {0}")]
    Session(#[from] SessionStateError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Failures of operator-only commands.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{caller} is not the operator")]
    Authorization { caller: UserIdentity },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// Malformed `/reply` invocation.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("expected a target chat id and a message, got {got} argument(s)")]
    MissingArguments { got: usize },

    #[error(transparent)]
    InvalidIdentity(#[from] IdentityParseError),
}

impl RelayError {
    /// The text reported back to the caller in chat.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authorization { .. } => "You do not have permission to run this command.",
            Self::Argument(ArgumentError::MissingArguments { .. }) => {
                "Usage: /reply <chat_id> <message>"
            }
            Self::Argument(ArgumentError::InvalidIdentity(_)) => "Invalid chat_id.",
        }
    }
}

/// Dialog operations invoked for an identity with no live session.
///
/// Indicates an upstream routing defect; logged, never shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionStateError {
    #[error("no active session for {user}")]
    NoActiveSession { user: UserIdentity },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
