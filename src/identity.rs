//! Chat participant identities.

use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identifier of a chat participant (Telegram chat id).
///
/// Used both as the session key and as the delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(i64);

impl UserIdentity {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserIdentity {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A token that is not a valid chat id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chat id {input:?}: {source}")]
pub struct IdentityParseError {
    pub input: String,
    #[source]
    pub source: ParseIntError,
}

impl FromStr for UserIdentity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|source| IdentityParseError {
                input: s.to_string(),
                source,
            })
    }
}

/// The single privileged identity: receives notifications and may issue
/// operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorIdentity(UserIdentity);

impl OperatorIdentity {
    pub const fn new(identity: UserIdentity) -> Self {
        Self(identity)
    }

    pub const fn identity(&self) -> UserIdentity {
        self.0
    }

    /// Whether `caller` is the operator.
    pub fn is(&self, caller: UserIdentity) -> bool {
        self.0 == caller
    }
}
