//! Channel abstraction for message I/O.

pub mod channel;
pub mod cli;
pub mod memory;
pub mod telegram;

pub use channel::*;
pub use cli::CliChannel;
pub use memory::RecordingSink;
pub use telegram::TelegramChannel;
