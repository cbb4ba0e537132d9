//! Freight intake bot: collects shipment requests over chat and relays
//! them to an operator.

pub mod channels;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod intake;
pub mod relay;
