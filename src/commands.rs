//! Inbound text classification: slash commands versus dialog replies.

/// A recognized (or unrecognized) slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: begin a new request.
    Start,
    /// `/cancel`: abandon the current request.
    Cancel,
    /// `/help`: list user commands.
    Help,
    /// `/admin_help`: list operator commands.
    AdminHelp,
    /// `/reply <chat_id> <message...>`: operator reply to a user.
    Reply { args: Vec<String> },
    /// Any other slash command; ignored.
    Unknown { name: String },
}

/// Classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    /// Non-command text, kept verbatim.
    Text(String),
}

/// Parses raw message content into an `Inbound`.
pub struct CommandParser;

impl CommandParser {
    pub fn parse(content: &str) -> Inbound {
        let trimmed = content.trim_start();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Inbound::Text(content.to_string());
        };

        let mut tokens = rest.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        // Telegram appends "@botname" to commands picked from the menu in groups
        let name = head.split('@').next().unwrap_or_default().to_lowercase();
        let args: Vec<String> = tokens.map(String::from).collect();

        let command = match name.as_str() {
            "start" => Command::Start,
            "cancel" => Command::Cancel,
            "help" => Command::Help,
            "admin_help" => Command::AdminHelp,
            "reply" => Command::Reply { args },
            _ => Command::Unknown { name },
        };
        Inbound::Command(command)
    }
}
