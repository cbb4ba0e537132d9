//! User-facing dialog text.

use super::state::{ConversationState, Field};

pub const COMPLETED: &str = "✅ Your request has been received. Please wait for confirmation!";

pub const CANCELLED: &str = "❌ Request cancelled.";

/// Prompt asking for `field`.
pub fn field_prompt(field: Field) -> &'static str {
    match field {
        Field::Departure => {
            "Enter the departure point:\n\
             To cancel, send /cancel\n\
             For help, send /help"
        }
        Field::Destination => "Enter the destination point(s) (separate several with commas):",
        Field::Cargo => "Enter the cargo type:",
        Field::Schedule => "Enter the desired date and time (e.g. DD.MM.YYYY HH:MM):",
        Field::Contact => "Enter your contact phone number or email:",
    }
}

/// Prompt for the field a session in `state` is waiting on.
pub fn prompt_for(state: ConversationState) -> Option<&'static str> {
    state.awaited_field().map(field_prompt)
}
