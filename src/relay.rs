//! Relay router: operator notification and operator-to-user replies.
//!
//! All operator gating compares the caller against the single configured
//! `OperatorIdentity`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::{MessageSink, deliver};
use crate::error::{ArgumentError, RelayError};
use crate::identity::{OperatorIdentity, UserIdentity};
use crate::intake::FinalizedRequest;

/// Prefix marking a message as written by the operator.
pub const OPERATOR_PREFIX: &str = "Admin: ";

pub const REPLY_SENT: &str = "Message sent.";

pub const USER_COMMANDS: &str = "Available commands:\n\
    /start - submit a new shipment request\n\
    /cancel - cancel the current request\n\
    /help - show this list of commands\n";

pub const OPERATOR_COMMANDS: &str = "Operator commands:\n\
    /reply <chat_id> <message> - reply to a user\n\
    /admin_help - show this list of commands\n";

/// A parsed `/reply <chat_id> <message...>` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyCommand {
    pub target: UserIdentity,
    pub text: String,
}

impl ReplyCommand {
    /// Parse whitespace-split command arguments.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ArgumentError> {
        let [target, words @ ..] = args else {
            return Err(ArgumentError::MissingArguments { got: 0 });
        };
        if words.is_empty() {
            return Err(ArgumentError::MissingArguments { got: 1 });
        }
        let target = target.as_ref().parse::<UserIdentity>()?;
        let text = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        Ok(Self { target, text })
    }
}

/// Routes finalized requests to the operator and operator replies to users.
pub struct RelayRouter {
    operator: OperatorIdentity,
    sink: Arc<dyn MessageSink>,
}

impl RelayRouter {
    pub fn new(operator: OperatorIdentity, sink: Arc<dyn MessageSink>) -> Self {
        Self { operator, sink }
    }

    pub fn is_operator(&self, caller: UserIdentity) -> bool {
        self.operator.is(caller)
    }

    fn authorize(&self, caller: UserIdentity) -> Result<(), RelayError> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Operator command rejected");
            Err(RelayError::Authorization { caller })
        }
    }

    /// Deliver a finished request to the operator.
    pub async fn notify_operator(&self, request: &FinalizedRequest) -> bool {
        let delivered = deliver(
            self.sink.as_ref(),
            self.operator.identity(),
            &request.render(),
        )
        .await;
        if delivered {
            info!(
                request_id = %request.id,
                requester = %request.requester,
                "Operator notified of new request"
            );
        }
        delivered
    }

    /// Forward an operator reply to a user and acknowledge the operator.
    ///
    /// Authorization is checked before arguments. Returns the target on
    /// success; the acknowledgment is only sent if delivery succeeded.
    pub async fn relay_operator_reply<S: AsRef<str>>(
        &self,
        caller: UserIdentity,
        args: &[S],
    ) -> Result<UserIdentity, RelayError> {
        self.authorize(caller)?;
        let reply = ReplyCommand::parse(args)?;

        let text = format!("{OPERATOR_PREFIX}{}", reply.text);
        match self.sink.send_message(reply.target, &text).await {
            Ok(()) => {
                info!(target_user = %reply.target, "Operator reply relayed");
                deliver(self.sink.as_ref(), caller, REPLY_SENT).await;
            }
            Err(e) => {
                warn!(target_user = %reply.target, error = %e, "Operator reply not delivered");
                deliver(
                    self.sink.as_ref(),
                    caller,
                    &format!("Failed to deliver message to {}.", reply.target),
                )
                .await;
            }
        }
        Ok(reply.target)
    }

    /// Help text for end users. Available to everyone.
    pub fn list_user_commands() -> &'static str {
        USER_COMMANDS
    }

    /// Help text for the operator.
    pub fn list_operator_commands(&self, caller: UserIdentity) -> Result<&'static str, RelayError> {
        self.authorize(caller)?;
        Ok(OPERATOR_COMMANDS)
    }
}
