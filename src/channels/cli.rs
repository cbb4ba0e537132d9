//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Each line is sent as the configured identity. Prefix a line with
//! `@<id> ` to send it as someone else, e.g. `@42 /start` or
//! `@1 /reply 42 on our way`.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageSink, MessageStream};
use crate::error::ChannelError;
use crate::identity::UserIdentity;

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    default_sender: UserIdentity,
}

impl CliChannel {
    pub fn new(default_sender: UserIdentity) -> Self {
        Self { default_sender }
    }
}

/// Split an optional `@<id> ` sender override off a console line.
fn parse_line(line: &str, default_sender: UserIdentity) -> (UserIdentity, &str) {
    if let Some(rest) = line.strip_prefix('@') {
        if let Some((id, text)) = rest.split_once(' ') {
            if let Ok(sender) = id.parse::<UserIdentity>() {
                return (sender, text.trim_start());
            }
        }
    }
    (default_sender, line)
}

#[async_trait]
impl MessageSink for CliChannel {
    async fn send_message(&self, to: UserIdentity, text: &str) -> Result<(), ChannelError> {
        println!("\n[to {to}]\n{text}\n");
        eprint!("> ");
        Ok(())
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let default_sender = self.default_sender;

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            // Print prompt
            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let (sender, text) = parse_line(line, default_sender);
                        let msg = IncomingMessage::new("cli", sender, text);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ME: UserIdentity = UserIdentity::new(1);

    #[test]
    fn plain_line_uses_default_sender() {
        assert_eq!(parse_line("Moscow", ME), (ME, "Moscow"));
    }

    #[test]
    fn at_prefix_overrides_sender() {
        assert_eq!(
            parse_line("@42 /start", ME),
            (UserIdentity::new(42), "/start")
        );
        assert_eq!(
            parse_line("@1 /reply 42 on our way", ME),
            (ME, "/reply 42 on our way")
        );
    }

    #[test]
    fn malformed_prefix_is_plain_text() {
        assert_eq!(parse_line("@bob hello", ME), (ME, "@bob hello"));
        assert_eq!(parse_line("@42", ME), (ME, "@42"));
    }

    #[test]
    fn cli_channel_name() {
        assert_eq!(CliChannel::new(ME).name(), "cli");
    }
}
