//! Intake dialog: collects a shipment request one field at a time.
//!
//! A user enters with `/start`, answers five prompts in fixed order, and the
//! completed request is rendered and relayed to the operator. Each user has
//! at most one live session in the `SessionStore`.

pub mod assembler;
pub mod engine;
pub mod model;
pub mod prompts;
pub mod session;
pub mod state;

pub use assembler::RequestAssembler;
pub use engine::{AdvanceOutcome, ConversationEngine};
pub use model::{FinalizedRequest, RequestDraft};
pub use session::{Session, SessionStore};
pub use state::{ConversationState, Field, TRANSITIONS, Transition};
