//! Request assembler: turns a finished draft into the operator payload.

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::identity::UserIdentity;

use super::model::{FinalizedRequest, RequestDraft};
use super::session::Session;
use super::state::Field;

/// Builds finalized requests and renders them for the operator.
pub struct RequestAssembler;

impl RequestAssembler {
    /// Snapshot the session's draft. Absent fields become the placeholder.
    pub fn finalize(session: &Session) -> FinalizedRequest {
        if !session.draft.is_complete() {
            warn!(
                user = %session.user,
                collected = session.draft.len(),
                "Finalizing an incomplete draft"
            );
        }
        let request = Self::from_draft(session.user, &session.draft);
        debug!(
            user = %session.user,
            request_id = %request.id,
            dialog_secs = (request.submitted_at - session.started_at).num_seconds(),
            "Request finalized"
        );
        request
    }

    pub fn from_draft(requester: UserIdentity, draft: &RequestDraft) -> FinalizedRequest {
        let value = |field| draft.get_or_placeholder(field).to_string();
        FinalizedRequest {
            id: Uuid::new_v4(),
            requester,
            departure: value(Field::Departure),
            destination: value(Field::Destination),
            cargo: value(Field::Cargo),
            schedule: value(Field::Schedule),
            contact: value(Field::Contact),
            submitted_at: Utc::now(),
        }
    }
}

impl FinalizedRequest {
    /// Canonical multi-line notification text.
    pub fn render(&self) -> String {
        format!(
            "📦 New shipment request:\n\n\
             🚚 Departure: {}\n\
             📍 Destination(s): {}\n\
             📦 Cargo type: {}\n\
             ⏳ Date and time: {}\n\
             ☎️ Contact: {}\n\
             🆔 User chat ID: {}",
            self.departure,
            self.destination,
            self.cargo,
            self.schedule,
            self.contact,
            self.requester,
        )
    }
}
