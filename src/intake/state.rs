//! Intake state machine: which field the next reply fills.

use serde::{Deserialize, Serialize};

/// A field of the shipment request, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Departure,
    Destination,
    Cargo,
    Schedule,
    Contact,
}

impl Field {
    /// All fields in collection order.
    pub const ALL: [Field; 5] = [
        Field::Departure,
        Field::Destination,
        Field::Cargo,
        Field::Schedule,
        Field::Contact,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Departure => "departure",
            Self::Destination => "destination",
            Self::Cargo => "cargo",
            Self::Schedule => "schedule",
            Self::Contact => "contact",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The step a live session is at.
///
/// Progresses linearly: AwaitingDeparture → AwaitingDestination →
/// AwaitingCargo → AwaitingSchedule → AwaitingContact → Complete.
/// "No session" is represented by the absence of a `Session`, not a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingDeparture,
    AwaitingDestination,
    AwaitingCargo,
    AwaitingSchedule,
    AwaitingContact,
    Complete,
}

/// One row of the transition table: a reply received in `from` fills
/// `fills` and moves the session to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConversationState,
    pub fills: Field,
    pub to: ConversationState,
}

/// The complete transition table. `Complete` has no outgoing row.
pub static TRANSITIONS: [Transition; 5] = [
    Transition {
        from: ConversationState::AwaitingDeparture,
        fills: Field::Departure,
        to: ConversationState::AwaitingDestination,
    },
    Transition {
        from: ConversationState::AwaitingDestination,
        fills: Field::Destination,
        to: ConversationState::AwaitingCargo,
    },
    Transition {
        from: ConversationState::AwaitingCargo,
        fills: Field::Cargo,
        to: ConversationState::AwaitingSchedule,
    },
    Transition {
        from: ConversationState::AwaitingSchedule,
        fills: Field::Schedule,
        to: ConversationState::AwaitingContact,
    },
    Transition {
        from: ConversationState::AwaitingContact,
        fills: Field::Contact,
        to: ConversationState::Complete,
    },
];

impl ConversationState {
    /// State of a freshly started session.
    pub const INITIAL: ConversationState = ConversationState::AwaitingDeparture;

    /// The table row that applies to a reply in this state.
    pub fn transition(&self) -> Option<&'static Transition> {
        TRANSITIONS.iter().find(|t| t.from == *self)
    }

    /// The field the next reply fills, if any.
    pub fn awaited_field(&self) -> Option<Field> {
        self.transition().map(|t| t.fills)
    }

    /// Get the next state in the linear progression, if any.
    pub fn next(&self) -> Option<ConversationState> {
        self.transition().map(|t| t.to)
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConversationState) -> bool {
        self.next() == Some(target)
    }

    /// Whether this state ends the dialog.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AwaitingDeparture => "awaiting_departure",
            Self::AwaitingDestination => "awaiting_destination",
            Self::AwaitingCargo => "awaiting_cargo",
            Self::AwaitingSchedule => "awaiting_schedule",
            Self::AwaitingContact => "awaiting_contact",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}
