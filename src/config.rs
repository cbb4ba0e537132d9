//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::identity::{OperatorIdentity, UserIdentity};

/// Which transport the binary runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Telegram,
    Cli,
}

/// Bot configuration, read from the environment at startup.
#[derive(Debug)]
pub struct BotConfig {
    pub transport: Transport,
    /// Bot API token. Present whenever `transport` is Telegram.
    pub bot_token: Option<SecretString>,
    /// Receives requests and may use operator commands.
    pub operator: OperatorIdentity,
    /// Sender identity for lines typed into the CLI transport.
    pub cli_user: UserIdentity,
    /// Per-identity workers retire after this long without events.
    pub worker_idle_timeout: Duration,
}

impl BotConfig {
    pub const DEFAULT_WORKER_IDLE: Duration = Duration::from_secs(300);

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let operator_raw = get("INTAKE_OPERATOR_CHAT_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("INTAKE_OPERATOR_CHAT_ID".into()))?;
        let operator = operator_raw
            .trim()
            .parse::<UserIdentity>()
            .map(OperatorIdentity::new)
            .map_err(|e| ConfigError::InvalidValue {
                key: "INTAKE_OPERATOR_CHAT_ID".into(),
                message: e.to_string(),
            })?;

        let transport = match get("INTAKE_TRANSPORT").as_deref().map(str::trim) {
            None | Some("telegram") => Transport::Telegram,
            Some("cli") => Transport::Cli,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "INTAKE_TRANSPORT".into(),
                    message: format!("expected 'telegram' or 'cli', got '{other}'"),
                });
            }
        };

        let bot_token = get("TELEGRAM_BOT_TOKEN").map(SecretString::from);
        if transport == Transport::Telegram && bot_token.is_none() {
            return Err(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()));
        }

        let cli_user = match get("INTAKE_CLI_USER_ID") {
            Some(raw) => raw
                .trim()
                .parse::<UserIdentity>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "INTAKE_CLI_USER_ID".into(),
                    message: e.to_string(),
                })?,
            None => UserIdentity::new(1),
        };

        let worker_idle_timeout = match get("INTAKE_WORKER_IDLE_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "INTAKE_WORKER_IDLE_SECS".into(),
                    message: format!("expected a positive number of seconds, got '{raw}'"),
                })?,
            None => Self::DEFAULT_WORKER_IDLE,
        };

        Ok(Self {
            transport,
            bot_token,
            operator,
            cli_user,
            worker_idle_timeout,
        })
    }
}
