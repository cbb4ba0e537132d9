//! Draft and finalized shipment request models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserIdentity;

use super::state::Field;

/// Rendered in place of a field that was never collected.
pub const NOT_SPECIFIED: &str = "not specified";

/// Field values collected so far, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDraft {
    values: BTreeMap<Field, String>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the raw reply for `field`. Last value wins.
    pub fn record(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Value of `field`, or the placeholder if absent.
    pub fn get_or_placeholder(&self, field: Field) -> &str {
        self.get(field).unwrap_or(NOT_SPECIFIED)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every field has a value.
    pub fn is_complete(&self) -> bool {
        Field::ALL.iter().all(|f| self.values.contains_key(f))
    }
}

/// Immutable snapshot of a completed request, ready for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizedRequest {
    pub id: Uuid,
    pub requester: UserIdentity,
    pub departure: String,
    /// One or more destinations, comma-delimited, kept as typed.
    pub destination: String,
    pub cargo: String,
    pub schedule: String,
    pub contact: String,
    pub submitted_at: DateTime<Utc>,
}
