//! ConversationEngine: drives the intake dialog for each user.
//!
//! Each operation runs to completion against the `SessionStore` before any
//! outbound message is sent, so the stored state is settled by the time the
//! user sees the next prompt.

use std::sync::Arc;

use tracing::{debug, info};

use crate::channels::{MessageSink, deliver};
use crate::error::SessionStateError;
use crate::identity::UserIdentity;
use crate::relay::RelayRouter;

use super::assembler::RequestAssembler;
use super::model::FinalizedRequest;
use super::prompts;
use super::session::SessionStore;
use super::state::ConversationState;

/// Result of feeding one reply to a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The reply was empty; nothing was stored and the prompt was repeated.
    Repeated { state: ConversationState },
    /// A field was filled and the session now awaits `state`.
    Prompted { state: ConversationState },
    /// The last field was filled; the session is gone.
    Completed(FinalizedRequest),
}

/// Per-user intake state machine.
pub struct ConversationEngine {
    store: Arc<SessionStore>,
    relay: Arc<RelayRouter>,
    sink: Arc<dyn MessageSink>,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<SessionStore>,
        relay: Arc<RelayRouter>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self { store, relay, sink }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Begin a dialog for `user`. Any in-flight draft is discarded.
    pub async fn start_dialog(&self, user: UserIdentity) {
        let replaced = self.store.create(user).await;
        info!(user = %user, restarted = replaced.is_some(), "Intake session started");

        if let Some(prompt) = prompts::prompt_for(ConversationState::INITIAL) {
            deliver(self.sink.as_ref(), user, prompt).await;
        }
    }

    /// Store `text` in the awaited field and move to the next step.
    ///
    /// On the last field the request is finalized, the session removed, the
    /// operator notified and the user acknowledged.
    pub async fn advance_dialog(
        &self,
        user: UserIdentity,
        text: &str,
    ) -> Result<AdvanceOutcome, SessionStateError> {
        let outcome = self
            .store
            .with_entry(user, |slot| {
                let session = slot.as_mut()?;
                let Some(transition) = session.state.transition() else {
                    // Complete sessions are removed in the same step that
                    // reaches Complete, so this is unreachable in practice.
                    *slot = None;
                    return None;
                };
                if text.trim().is_empty() {
                    return Some(AdvanceOutcome::Repeated {
                        state: session.state,
                    });
                }

                session.draft.record(transition.fills, text);
                session.state = transition.to;

                if session.state.is_terminal() {
                    let request = RequestAssembler::finalize(session);
                    *slot = None;
                    Some(AdvanceOutcome::Completed(request))
                } else {
                    Some(AdvanceOutcome::Prompted {
                        state: session.state,
                    })
                }
            })
            .await
            .ok_or(SessionStateError::NoActiveSession { user })?;

        match &outcome {
            AdvanceOutcome::Repeated { state } | AdvanceOutcome::Prompted { state } => {
                if matches!(outcome, AdvanceOutcome::Repeated { .. }) {
                    debug!(user = %user, state = %state, "Empty reply, prompt repeated");
                } else {
                    debug!(user = %user, state = %state, "Intake session advanced");
                }
                if let Some(prompt) = prompts::prompt_for(*state) {
                    deliver(self.sink.as_ref(), user, prompt).await;
                }
            }
            AdvanceOutcome::Completed(request) => {
                info!(user = %user, request_id = %request.id, "Intake session completed");
                self.relay.notify_operator(request).await;
                deliver(self.sink.as_ref(), user, prompts::COMPLETED).await;
            }
        }

        Ok(outcome)
    }

    /// Drop any session for `user` and acknowledge. Safe to repeat.
    pub async fn cancel_dialog(&self, user: UserIdentity) {
        match self.store.remove(user).await {
            Some(session) => {
                info!(user = %user, state = %session.state, "Intake session cancelled")
            }
            None => debug!(user = %user, "Cancel with no active session"),
        }
        deliver(self.sink.as_ref(), user, prompts::CANCELLED).await;
    }
}
