//! Dispatcher: maps inbound transport events onto dialog and relay
//! operations.
//!
//! Events for one identity are handled strictly in arrival order by a
//! dedicated worker task; different identities proceed concurrently. A
//! worker that sees no events for `idle_timeout` retires, so identities that
//! are not talking to the bot hold no task. When the inbound stream ends,
//! every queue is closed and `run` waits for the workers to finish what they
//! already hold.
//!
//! Every handler failure is reported to the caller (or logged) at the
//! boundary of its own event and never affects other identities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::channels::{IncomingMessage, MessageSink, MessageStream, deliver};
use crate::commands::{Command, CommandParser, Inbound};
use crate::identity::UserIdentity;
use crate::intake::ConversationEngine;
use crate::relay::RelayRouter;

type Queue = mpsc::UnboundedSender<IncomingMessage>;

/// Routes inbound events, serialized per identity.
pub struct Dispatcher {
    engine: Arc<ConversationEngine>,
    relay: Arc<RelayRouter>,
    sink: Arc<dyn MessageSink>,
    queues: Mutex<HashMap<UserIdentity, Queue>>,
    workers: Mutex<JoinSet<()>>,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<ConversationEngine>,
        relay: Arc<RelayRouter>,
        sink: Arc<dyn MessageSink>,
        idle_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            relay,
            sink,
            queues: Mutex::new(HashMap::new()),
            workers: Mutex::new(JoinSet::new()),
            idle_timeout,
        })
    }

    /// Handle a single event to completion.
    pub async fn handle(&self, message: &IncomingMessage) {
        let caller = message.sender;
        debug!(
            message_id = %message.id,
            channel = %message.channel,
            user = %caller,
            user_name = message.user_name.as_deref().unwrap_or("-"),
            queued_ms = (chrono::Utc::now() - message.received_at).num_milliseconds(),
            "Handling message"
        );

        match CommandParser::parse(&message.content) {
            Inbound::Text(text) => {
                if let Err(e) = self.engine.advance_dialog(caller, &text).await {
                    debug!(user = %caller, error = %e, "Ignoring text outside a dialog");
                }
            }
            Inbound::Command(Command::Start) => self.engine.start_dialog(caller).await,
            Inbound::Command(Command::Cancel) => self.engine.cancel_dialog(caller).await,
            Inbound::Command(Command::Help) => {
                deliver(self.sink.as_ref(), caller, RelayRouter::list_user_commands()).await;
            }
            Inbound::Command(Command::AdminHelp) => {
                let text = match self.relay.list_operator_commands(caller) {
                    Ok(text) => text,
                    Err(e) => e.user_message(),
                };
                deliver(self.sink.as_ref(), caller, text).await;
            }
            Inbound::Command(Command::Reply { args }) => {
                if let Err(e) = self.relay.relay_operator_reply(caller, &args).await {
                    debug!(user = %caller, error = %e, "Reply command rejected");
                    deliver(self.sink.as_ref(), caller, e.user_message()).await;
                }
            }
            Inbound::Command(Command::Unknown { name }) => {
                debug!(user = %caller, command = %name, "Ignoring unknown command");
            }
        }
    }

    /// Queue an event behind any in-flight events of the same identity.
    pub async fn dispatch(self: &Arc<Self>, message: IncomingMessage) {
        let user = message.sender;
        let mut queues = self.queues.lock().await;

        let message = match queues.get(&user) {
            Some(queue) => match queue.send(message) {
                Ok(()) => return,
                // Worker is gone; start a new one below.
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // rx is alive, so this cannot fail
        let _ = tx.send(message);
        queues.insert(user, tx);
        drop(queues);

        let this = Arc::clone(self);
        let mut workers = self.workers.lock().await;
        // Reap retired workers so the set only tracks live ones.
        while workers.try_join_next().is_some() {}
        workers.spawn(async move { this.drain(user, rx).await });
    }

    async fn drain(self: Arc<Self>, user: UserIdentity, mut rx: mpsc::UnboundedReceiver<IncomingMessage>) {
        loop {
            let next = match tokio::time::timeout(self.idle_timeout, rx.recv()).await {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(_) => {
                    // Retire under the map lock so no event can slip in
                    // between the emptiness check and the removal.
                    let mut queues = self.queues.lock().await;
                    match rx.try_recv() {
                        Ok(message) => message,
                        Err(_) => {
                            queues.remove(&user);
                            debug!(user = %user, "Worker retired");
                            break;
                        }
                    }
                }
            };
            self.handle(&next).await;
        }
    }

    /// Number of identities with a live worker.
    pub async fn active_workers(&self) -> usize {
        self.queues.lock().await.len()
    }

    /// Consume `stream` until it ends or Ctrl+C is received.
    pub async fn run(self: Arc<Self>, mut stream: MessageStream) {
        info!("Intake bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            self.dispatch(message).await;
        }

        self.finish_workers().await;
    }

    /// Close every queue and wait until each worker has handled the events
    /// it already holds.
    async fn finish_workers(&self) {
        let pending = {
            let mut queues = self.queues.lock().await;
            let pending = queues.len();
            queues.clear();
            pending
        };
        if pending > 0 {
            info!(pending, "Waiting for queued identities to finish");
        }

        let mut workers = std::mem::take(&mut *self.workers.lock().await);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Worker task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::RecordingSink;
    use crate::identity::OperatorIdentity;
    use crate::intake::{ConversationState, SessionStore, prompts};
    use crate::relay::{OPERATOR_COMMANDS, USER_COMMANDS};

    const OPERATOR: UserIdentity = UserIdentity::new(1000);
    const ALICE: UserIdentity = UserIdentity::new(1);

    fn setup(idle: Duration) -> (Arc<Dispatcher>, Arc<RecordingSink>, Arc<SessionStore>) {
        let sink = Arc::new(RecordingSink::new());
        let store = Arc::new(SessionStore::new());
        let relay = Arc::new(RelayRouter::new(OperatorIdentity::new(OPERATOR), sink.clone()));
        let engine = Arc::new(ConversationEngine::new(
            store.clone(),
            relay.clone(),
            sink.clone(),
        ));
        let dispatcher = Dispatcher::new(engine, relay, sink.clone(), idle);
        (dispatcher, sink, store)
    }

    fn msg(from: UserIdentity, text: &str) -> IncomingMessage {
        IncomingMessage::new("test", from, text)
    }

    #[tokio::test]
    async fn start_command_opens_session() {
        let (d, _sink, store) = setup(Duration::from_secs(1));
        d.handle(&msg(ALICE, "/start")).await;
        assert_eq!(
            store.state_of(ALICE).await,
            Some(ConversationState::AwaitingDeparture)
        );
    }

    #[tokio::test]
    async fn text_without_session_is_silently_ignored() {
        let (d, sink, store) = setup(Duration::from_secs(1));
        d.handle(&msg(ALICE, "hello")).await;
        assert!(sink.sent().is_empty());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn commands_do_not_advance_dialog() {
        let (d, sink, store) = setup(Duration::from_secs(1));
        d.handle(&msg(ALICE, "/start")).await;
        d.handle(&msg(ALICE, "/help")).await;
        d.handle(&msg(ALICE, "/weather")).await;

        let session = store.get(ALICE).await.unwrap();
        assert_eq!(session.state, ConversationState::AwaitingDeparture);
        assert!(session.draft.is_empty());
        assert_eq!(sink.sent_to(ALICE).last().map(String::as_str), Some(USER_COMMANDS));
    }

    #[tokio::test]
    async fn admin_help_is_gated() {
        let (d, sink, _store) = setup(Duration::from_secs(1));
        d.handle(&msg(ALICE, "/admin_help")).await;
        d.handle(&msg(OPERATOR, "/admin_help")).await;

        assert_eq!(
            sink.sent_to(ALICE),
            vec!["You do not have permission to run this command."]
        );
        assert_eq!(sink.sent_to(OPERATOR), vec![OPERATOR_COMMANDS]);
    }

    #[tokio::test]
    async fn reply_errors_are_reported_to_caller() {
        let (d, sink, _store) = setup(Duration::from_secs(1));
        d.handle(&msg(OPERATOR, "/reply 12345")).await;
        d.handle(&msg(OPERATOR, "/reply notanumber hi")).await;
        d.handle(&msg(ALICE, "/reply 12345 hi")).await;

        assert_eq!(
            sink.sent_to(OPERATOR),
            vec!["Usage: /reply <chat_id> <message>", "Invalid chat_id."]
        );
        assert_eq!(
            sink.sent_to(ALICE),
            vec!["You do not have permission to run this command."]
        );
        assert!(sink.sent_to(UserIdentity::new(12345)).is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_dialog_then_text_is_ignored() {
        let (d, sink, store) = setup(Duration::from_secs(1));
        d.handle(&msg(ALICE, "/start")).await;
        d.handle(&msg(ALICE, "Moscow")).await;
        d.handle(&msg(ALICE, "/cancel")).await;
        sink.clear();
        d.handle(&msg(ALICE, "Kazan")).await;

        assert!(store.is_empty().await);
        assert!(sink.sent().is_empty());
        assert!(sink.sent_to(OPERATOR).is_empty());
    }

    #[tokio::test]
    async fn run_returns_after_queued_events_are_handled() {
        let (d, sink, store) = setup(Duration::from_secs(60));
        let events: Vec<IncomingMessage> =
            ["/start", "Moscow", "Kazan", "furniture", "today", "me@x.io"]
                .into_iter()
                .map(|text| msg(ALICE, text))
                .collect();
        let stream: MessageStream = Box::pin(futures::stream::iter(events));

        tokio::time::timeout(Duration::from_secs(5), Arc::clone(&d).run(stream))
            .await
            .expect("run should return once workers are done");

        assert_eq!(sink.sent_to(OPERATOR).len(), 1);
        assert_eq!(d.active_workers().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn dispatch_preserves_per_identity_order_and_retires_workers() {
        let (d, sink, store) = setup(Duration::from_millis(50));
        for text in ["/start", "Moscow", "Kazan", "furniture", "today", "me@x.io"] {
            d.dispatch(msg(ALICE, text)).await;
        }

        tokio::time::timeout(Duration::from_secs(5), async {
            while sink.sent_to(OPERATOR).is_empty() || d.active_workers().await > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("worker should finish and retire");

        assert!(store.is_empty().await);
        let notes = sink.sent_to(OPERATOR);
        let note = &notes[0];
        assert!(note.contains("Departure: Moscow"));
        assert!(note.contains("Contact: me@x.io"));
        assert_eq!(
            sink.sent_to(ALICE).last().map(String::as_str),
            Some(prompts::COMPLETED)
        );
    }
}
