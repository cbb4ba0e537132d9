//! End-to-end intake flows driven through the dispatcher.
//!
//! The transport is replaced by a `RecordingSink`; inbound events are fed
//! either one by one or as a finite stream through `Dispatcher::run`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use freight_intake::channels::{IncomingMessage, MessageStream, RecordingSink};
use freight_intake::dispatcher::Dispatcher;
use freight_intake::identity::{OperatorIdentity, UserIdentity};
use freight_intake::intake::{ConversationEngine, SessionStore, prompts};
use freight_intake::relay::{REPLY_SENT, RelayRouter};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const OPERATOR: UserIdentity = UserIdentity::new(500);
const USER_A: UserIdentity = UserIdentity::new(12345);
const USER_B: UserIdentity = UserIdentity::new(67890);

struct Harness {
    dispatcher: Arc<Dispatcher>,
    sink: Arc<RecordingSink>,
    store: Arc<SessionStore>,
}

fn harness() -> Harness {
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(SessionStore::new());
    let relay = Arc::new(RelayRouter::new(OperatorIdentity::new(OPERATOR), sink.clone()));
    let engine = Arc::new(ConversationEngine::new(
        Arc::clone(&store),
        Arc::clone(&relay),
        sink.clone(),
    ));
    let dispatcher = Dispatcher::new(engine, relay, sink.clone(), Duration::from_millis(50));
    Harness {
        dispatcher,
        sink,
        store,
    }
}

fn msg(from: UserIdentity, text: &str) -> IncomingMessage {
    IncomingMessage::new("test", from, text)
}

/// Wait until `n` messages reached the operator and every worker retired.
async fn settle(h: &Harness, operator_messages: usize) {
    timeout(TEST_TIMEOUT, async {
        while h.sink.sent_to(OPERATOR).len() < operator_messages
            || h.dispatcher.active_workers().await > 0
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("dispatcher did not settle");
}

#[tokio::test]
async fn full_request_reaches_operator() {
    let h = harness();
    for text in [
        "/start",
        "Moscow",
        "Kazan, Samara",
        "furniture",
        "01.01.2030 10:00",
        "+7123456789",
    ] {
        h.dispatcher.handle(&msg(USER_A, text)).await;
    }

    let notes = h.sink.sent_to(OPERATOR);
    assert_eq!(notes.len(), 1, "exactly one operator notification");
    for needle in [
        "Moscow",
        "Kazan, Samara",
        "furniture",
        "01.01.2030 10:00",
        "+7123456789",
        "12345",
    ] {
        assert!(notes[0].contains(needle), "notification missing {needle}");
    }

    let to_user = h.sink.sent_to(USER_A);
    assert_eq!(
        to_user.iter().filter(|t| t.as_str() == prompts::COMPLETED).count(),
        1
    );
    assert_eq!(to_user.last().map(String::as_str), Some(prompts::COMPLETED));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn operator_reply_round_trip() {
    let h = harness();
    h.dispatcher.handle(&msg(OPERATOR, "/reply 12345 hi there")).await;

    assert_eq!(h.sink.sent_to(USER_A), vec!["Admin: hi there"]);
    assert_eq!(h.sink.sent_to(OPERATOR), vec![REPLY_SENT]);
}

#[tokio::test]
async fn operator_reply_with_bad_target_delivers_nothing() {
    let h = harness();
    h.dispatcher.handle(&msg(OPERATOR, "/reply notanumber hi")).await;

    assert_eq!(h.sink.sent(), vec![(OPERATOR, "Invalid chat_id.".to_string())]);
}

#[tokio::test]
async fn non_operator_cannot_relay() {
    let h = harness();
    h.dispatcher.handle(&msg(USER_B, "/reply 12345 spoofed")).await;

    assert!(h.sink.sent_to(USER_A).is_empty());
    assert_eq!(h.sink.sent().len(), 1);
}

#[tokio::test]
async fn restart_mid_dialog_discards_previous_answers() {
    let h = harness();
    for text in ["/start", "Moscow", "Kazan", "/start"] {
        h.dispatcher.handle(&msg(USER_A, text)).await;
    }
    for text in ["Tver", "Omsk", "steel", "tomorrow", "a@b.c"] {
        h.dispatcher.handle(&msg(USER_A, text)).await;
    }

    let notes = h.sink.sent_to(OPERATOR);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("Departure: Tver"));
    assert!(!notes[0].contains("Moscow"));
}

#[tokio::test]
async fn concurrent_users_do_not_cross_contaminate() {
    let h = harness();
    let a = ["/start", "Moscow", "Kazan", "furniture", "monday", "a@mail.ru"];
    let b = ["/start", "Tver", "Omsk, Tomsk", "steel", "friday", "+7000"];

    for (ta, tb) in a.iter().zip(b.iter()) {
        h.dispatcher.dispatch(msg(USER_A, ta)).await;
        h.dispatcher.dispatch(msg(USER_B, tb)).await;
    }
    settle(&h, 2).await;

    let notes = h.sink.sent_to(OPERATOR);
    let note_a = notes.iter().find(|n| n.contains("12345")).expect("A's request");
    let note_b = notes.iter().find(|n| n.contains("67890")).expect("B's request");

    assert!(note_a.contains("Departure: Moscow") && note_a.contains("a@mail.ru"));
    assert!(!note_a.contains("Tver") && !note_a.contains("steel"));
    assert!(note_b.contains("Destination(s): Omsk, Tomsk") && note_b.contains("+7000"));
    assert!(!note_b.contains("Moscow") && !note_b.contains("furniture"));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn run_loop_drains_a_finite_stream() {
    let h = harness();
    let events = vec![
        msg(USER_A, "/start"),
        msg(USER_A, "Moscow"),
        msg(USER_A, "Kazan"),
        msg(USER_A, "furniture"),
        msg(USER_A, "today"),
        msg(USER_A, "phone"),
        msg(OPERATOR, "/reply 12345 confirmed"),
    ];
    let stream: MessageStream = Box::pin(tokio_stream::iter(events));

    timeout(TEST_TIMEOUT, Arc::clone(&h.dispatcher).run(stream))
        .await
        .expect("run loop should stop when the stream ends");

    // run only returns once every queued event has been handled.
    assert_eq!(h.dispatcher.active_workers().await, 0);
    assert!(h.store.is_empty().await);

    // The two identities run on separate workers, so only per-identity
    // order is defined.
    assert!(h.sink.sent_to(USER_A).iter().any(|t| t == "Admin: confirmed"));
    let to_operator = h.sink.sent_to(OPERATOR);
    assert_eq!(to_operator.len(), 2);
    assert!(to_operator.iter().any(|t| t.contains("Cargo type: furniture")));
    assert!(to_operator.iter().any(|t| t == REPLY_SENT));
}

#[tokio::test]
async fn stream_end_does_not_drop_a_request_still_queued() {
    // Long idle timeout: workers would otherwise outlive the stream.
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(SessionStore::new());
    let relay = Arc::new(RelayRouter::new(OperatorIdentity::new(OPERATOR), sink.clone()));
    let engine = Arc::new(ConversationEngine::new(
        Arc::clone(&store),
        Arc::clone(&relay),
        sink.clone(),
    ));
    let dispatcher = Dispatcher::new(engine, relay, sink.clone(), Duration::from_secs(60));

    let events: Vec<IncomingMessage> = ["/start", "Moscow", "Kazan", "furniture", "today", "phone"]
        .into_iter()
        .map(|text| msg(USER_B, text))
        .collect();
    let stream: MessageStream = Box::pin(tokio_stream::iter(events));

    timeout(TEST_TIMEOUT, Arc::clone(&dispatcher).run(stream))
        .await
        .expect("run should finish queued work and return");

    let notes = sink.sent_to(OPERATOR);
    assert_eq!(notes.len(), 1, "finished request must reach the operator");
    assert!(notes[0].contains("67890"));
    assert_eq!(
        sink.sent_to(USER_B).last().map(String::as_str),
        Some(prompts::COMPLETED)
    );
    assert_eq!(dispatcher.active_workers().await, 0);
    assert!(store.is_empty().await);
}
