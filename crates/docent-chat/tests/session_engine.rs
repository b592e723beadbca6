//! End-to-end scenarios for the session engine against a scripted backend.
//!
//! Each test owns its controller and mock, so they run independently.

use std::time::Duration;

use docent_chat::{
    ChatBackend, ExchangeOutcome, ExchangePhase, MockBackend, MockReply, ModeController,
};
use docent_core::config::ChatConfig;
use docent_core::types::{ChatMode, MessageEntry, Role};
use docent_core::LogUpdate;
use tokio::sync::broadcast;

// =============================================================================
// Helpers
// =============================================================================

fn engine(replies: impl IntoIterator<Item = MockReply>) -> ModeController<MockBackend> {
    ModeController::new(MockBackend::with_replies(replies), &ChatConfig::default())
}

fn drain(rx: &mut broadcast::Receiver<LogUpdate>) -> Vec<LogUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn assert_single_pending_at_end(entries: &[MessageEntry]) {
    let pending: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_pending())
        .map(|(i, _)| i)
        .collect();
    assert!(pending.len() <= 1, "more than one placeholder: {entries:?}");
    if let Some(&i) = pending.first() {
        assert_eq!(i, entries.len() - 1, "placeholder not last: {entries:?}");
    }
}

// =============================================================================
// Document mode
// =============================================================================

#[tokio::test]
async fn document_question_round_trip() {
    let mut c = engine([MockReply::answer("It is about X.")]);
    c.set_chunks(vec!["para 1".into(), "para 2".into()]);
    let mut rx = c.subscribe();

    c.set_input("What is this about?");
    let pending = c.submit().expect("submit accepted");
    assert_eq!(
        c.snapshot(),
        vec![
            MessageEntry::user("What is this about?"),
            MessageEntry::pending("Thinking...")
        ]
    );
    assert!(c.loading());

    assert!(matches!(pending.run().await, ExchangeOutcome::Completed { .. }));
    assert_eq!(
        c.snapshot(),
        vec![
            MessageEntry::user("What is this about?"),
            MessageEntry::assistant("It is about X.")
        ]
    );
    assert!(!c.loading());

    let updates = drain(&mut rx);
    assert!(updates.iter().all(|u| u.mode == ChatMode::Document));
    for update in &updates {
        assert_single_pending_at_end(&update.entries);
    }
}

#[tokio::test]
async fn document_mode_requires_loaded_document() {
    let mut c = engine([]);
    c.set_input("anything");
    assert!(c.send().await.is_none());
    assert!(c.snapshot().is_empty());
    assert_eq!(c.backend().request_count(), 0);
}

#[tokio::test]
async fn document_backend_failure_shows_error_text() {
    let mut c = engine([MockReply::Fail]);
    c.set_chunks(vec!["para".into()]);
    c.set_input("q");
    let outcome = c.send().await.unwrap();
    assert!(matches!(outcome, ExchangeOutcome::Failed { .. }));
    assert_eq!(
        c.snapshot().last(),
        Some(&MessageEntry::assistant("⚠️ Error connecting to AI backend."))
    );
    assert_eq!(c.phase(), ExchangePhase::Idle);
}

// =============================================================================
// Conversation mode
// =============================================================================

#[tokio::test]
async fn conversation_stream_updates_single_entry() {
    let mut c = engine([MockReply::fragments(["Hel", "lo ", "world"])]);
    c.set_mode(ChatMode::Conversation);
    let mut rx = c.subscribe();

    c.set_input("say hello");
    c.send().await.unwrap();

    let updates = drain(&mut rx);
    let lasts: Vec<(Role, String)> = updates
        .iter()
        .filter_map(LogUpdate::last)
        .map(|e| (e.role, e.content.clone()))
        .collect();
    assert_eq!(
        lasts,
        vec![
            (Role::Pending, "Thinking...".into()),
            (Role::Assistant, "Hel".into()),
            (Role::Assistant, "Hello ".into()),
            (Role::Assistant, "Hello world".into()),
        ]
    );
    // The log never grows past one user turn and one answer.
    assert!(updates.iter().all(|u| u.entries.len() == 2));
    assert_eq!(c.snapshot().len(), 2);
}

#[tokio::test]
async fn conversation_broken_stream_keeps_partial_answer_and_adds_error() {
    let mut c = engine([MockReply::FragmentsThenFail(vec!["Part".into(), "ial".into()])]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("q");
    let outcome = c.send().await.unwrap();
    assert!(matches!(outcome, ExchangeOutcome::Failed { .. }));
    assert_eq!(
        c.snapshot(),
        vec![
            MessageEntry::user("q"),
            MessageEntry::assistant("Partial"),
            MessageEntry::assistant("⚠️ Error connecting to AI backend."),
        ]
    );
    assert!(c.last_error().is_some());
}

#[tokio::test]
async fn conversation_empty_stream_yields_empty_answer() {
    let mut c = engine([MockReply::Fragments(vec![])]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("q");
    c.send().await.unwrap();
    assert_eq!(
        c.snapshot(),
        vec![MessageEntry::user("q"), MessageEntry::assistant("")]
    );
}

#[tokio::test]
async fn conversation_multibyte_split_across_fragments() {
    let bytes = "naïve café".as_bytes().to_vec();
    let mut c = engine([MockReply::Bytes(vec![
        bytes[..3].to_vec(),
        bytes[3..10].to_vec(),
        bytes[10..].to_vec(),
    ])]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("q");
    let outcome = c.send().await.unwrap();
    assert_eq!(
        outcome,
        ExchangeOutcome::Completed {
            content: "naïve café".into()
        }
    );
}

#[tokio::test]
async fn conversation_history_is_sent_with_each_turn() {
    let mut c = engine([
        MockReply::fragments(["A1"]),
        MockReply::fragments(["A2"]),
    ]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("Q1");
    c.send().await.unwrap();
    c.set_input("Q2");
    c.send().await.unwrap();

    let requests = c.backend().chat_requests();
    let second = &requests[1];
    assert_eq!(
        second.messages,
        vec![
            MessageEntry::user("Q1"),
            MessageEntry::assistant("A1"),
            MessageEntry::user("Q2"),
        ]
    );
    assert_eq!(second.chunks, None);
}

// =============================================================================
// Mode switching and sessions
// =============================================================================

#[tokio::test]
async fn switching_modes_keeps_logs_separate() {
    let mut c = engine([MockReply::answer("doc answer"), MockReply::fragments(["chat answer"])]);
    c.set_chunks(vec!["para".into()]);
    c.set_input("doc q");
    c.send().await.unwrap();

    c.set_mode(ChatMode::Conversation);
    c.set_input("chat q");
    c.send().await.unwrap();

    assert_eq!(
        c.snapshot_of(ChatMode::Document),
        vec![MessageEntry::user("doc q"), MessageEntry::assistant("doc answer")]
    );
    assert_eq!(
        c.snapshot_of(ChatMode::Conversation),
        vec![MessageEntry::user("chat q"), MessageEntry::assistant("chat answer")]
    );
}

#[tokio::test]
async fn new_chat_uses_fresh_session_in_next_request() {
    let mut c = engine([MockReply::fragments(["one"]), MockReply::fragments(["two"])]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("first");
    c.send().await.unwrap();
    c.new_chat();
    c.set_input("second");
    c.send().await.unwrap();

    let requests = c.backend().chat_requests();
    assert_ne!(requests[0].session, requests[1].session);
    assert_eq!(requests[1].messages, vec![MessageEntry::user("second")]);
}

#[tokio::test]
async fn mode_switch_while_in_flight_lands_in_original_log() {
    let (tx, reply) = MockReply::channel();
    let mut c = engine([reply]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("slow question");
    let pending = c.submit().unwrap();
    let task = tokio::spawn(pending.run());

    c.set_mode(ChatMode::Document);
    tx.send(Ok(b"slow answer".to_vec())).unwrap();
    drop(tx);

    // Entering document mode does not touch the conversation slot.
    let outcome = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("exchange finished")
        .unwrap();
    assert!(matches!(outcome, ExchangeOutcome::Completed { .. }));
    assert!(c.snapshot().is_empty());
    assert_eq!(
        c.snapshot_of(ChatMode::Conversation),
        vec![
            MessageEntry::user("slow question"),
            MessageEntry::assistant("slow answer")
        ]
    );
}

#[tokio::test]
async fn reset_while_in_flight_discards_late_reply() {
    let (tx, reply) = MockReply::channel();
    let mut c = engine([reply]);
    c.set_mode(ChatMode::Conversation);
    c.set_input("q");
    let task = tokio::spawn(c.submit().unwrap().run());

    c.reset();
    tx.send(Ok(b"too late".to_vec())).unwrap();
    drop(tx);

    assert_eq!(task.await.unwrap(), ExchangeOutcome::Superseded);
    assert!(c.snapshot().is_empty());
    assert!(!c.loading());
}

// =============================================================================
// Observers
// =============================================================================

#[tokio::test]
async fn every_subscriber_sees_every_update() {
    let mut c = engine([MockReply::fragments(["a", "b"])]);
    c.set_mode(ChatMode::Conversation);
    let mut first = c.subscribe();
    let mut second = c.subscribe();

    c.set_input("q");
    c.send().await.unwrap();

    let a = drain(&mut first);
    let b = drain(&mut second);
    assert_eq!(a.len(), b.len());
    assert_eq!(a.last().unwrap().entries, c.snapshot());
    assert!(a.iter().all(|u| u.mode == ChatMode::Conversation));
}

#[tokio::test]
async fn shared_backend_sees_requests_from_controller() {
    let backend = std::sync::Arc::new(MockBackend::with_replies([MockReply::answer("ok")]));
    let mut c = ModeController::with_shared_backend(backend.clone(), &ChatConfig::default());
    c.set_chunks(vec!["x".into()]);
    c.set_input("q");
    c.send().await.unwrap();
    assert_eq!(backend.ask_requests().len(), 1);
    // The trait is usable through the shared handle as well.
    assert!(backend
        .ask(&docent_chat::AskRequest {
            query: "again".into(),
            chunks: vec![]
        })
        .await
        .is_err());
}
