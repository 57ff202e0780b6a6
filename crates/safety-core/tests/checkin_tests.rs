//! Check-in timer tests.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use common::{befriend, harness, start_time};
use database::{checkin, CheckInStatus, Database};
use safety_core::{
    CoreError, Engine, EngineConfig, ManualClock, PushError, PushEvent, PushEventKind, PushSink,
    RespondAction,
};

#[tokio::test]
async fn test_start_uses_default_duration() {
    let h = harness().await;

    let session = h.engine.checkins().start("alice", None, "").await.unwrap();
    assert_eq!(session.status, CheckInStatus::Active);
    assert_eq!(session.started_at, start_time());
    assert_eq!(session.expires_at, start_time() + Duration::minutes(30));
    assert_eq!(session.message, "");
}

#[tokio::test]
async fn test_second_start_retires_first() {
    let h = harness().await;
    let checkins = h.engine.checkins();

    let first = checkins.start("alice", Some(60), "hiking").await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let second = checkins.start("alice", Some(15), "driving home").await.unwrap();

    let active = checkins.active("alice").await.unwrap().unwrap();
    assert_eq!(active.id, second.id);
    assert_eq!(active.message, "driving home");

    let all = checkin::list_for_user(h.db.pool(), "alice").await.unwrap();
    assert_eq!(all.len(), 2);
    let retired = all.iter().find(|s| s.id == first.id).unwrap();
    assert_eq!(retired.status, CheckInStatus::Safe);
}

#[tokio::test]
async fn test_mark_safe_without_session_is_noop() {
    let h = harness().await;
    let checkins = h.engine.checkins();

    assert_eq!(checkins.mark_safe("alice").await.unwrap(), 0);

    checkins.start("alice", Some(10), "").await.unwrap();
    assert_eq!(checkins.mark_safe("alice").await.unwrap(), 1);
    assert!(checkins.active("alice").await.unwrap().is_none());
    assert_eq!(checkins.mark_safe("alice").await.unwrap(), 0);
}

#[tokio::test]
async fn test_start_validation() {
    let h = harness().await;
    let checkins = h.engine.checkins();

    assert!(matches!(
        checkins.start("alice", Some(0), "").await,
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        checkins.start("alice", Some(8 * 24 * 60), "").await,
        Err(CoreError::Validation(_))
    ));
    assert!(checkins.active("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sweep_alerts_friends_once() {
    let h = harness().await;
    befriend(&h, "alice", "bob").await;
    befriend(&h, "carol", "alice").await;
    let checkins = h.engine.checkins();

    let session = checkins.start("alice", Some(20), "walking home").await.unwrap();
    checkins.start("bob", Some(120), "").await.unwrap();

    // Not yet expired.
    h.clock.advance(Duration::minutes(20));
    assert!(checkins.sweep_now().await.unwrap().is_empty());

    h.clock.advance(Duration::minutes(1));
    let alerted = checkins.sweep_now().await.unwrap();
    assert_eq!(alerted.len(), 1);
    assert_eq!(alerted[0].id, session.id);
    assert_eq!(alerted[0].status, CheckInStatus::Alerted);

    let mut notified: Vec<_> = h
        .sink
        .of_kind(PushEventKind::CheckInAlerted)
        .into_iter()
        .map(|e| e.user_id)
        .collect();
    notified.sort();
    assert_eq!(notified, vec!["bob".to_string(), "carol".to_string()]);

    // Already alerted sessions are skipped.
    assert!(checkins.sweep_now().await.unwrap().is_empty());
    assert_eq!(h.sink.of_kind(PushEventKind::CheckInAlerted).len(), 2);
    assert!(checkins.active("alice").await.unwrap().is_none());
    assert!(checkins.active("bob").await.unwrap().is_some());
}

#[tokio::test]
async fn test_safe_before_deadline_skips_alert() {
    let h = harness().await;
    befriend(&h, "alice", "bob").await;
    let checkins = h.engine.checkins();

    checkins.start("alice", Some(5), "").await.unwrap();
    h.clock.advance(Duration::minutes(4));
    checkins.mark_safe("alice").await.unwrap();

    h.clock.advance(Duration::hours(1));
    assert!(checkins.sweep_now().await.unwrap().is_empty());
    assert!(h.sink.of_kind(PushEventKind::CheckInAlerted).is_empty());
}

#[tokio::test]
async fn test_friend_lookup_failure_keeps_session_active() {
    let h = harness().await;
    befriend(&h, "alice", "bob").await;
    let checkins = h.engine.checkins();

    checkins.start("alice", Some(5), "").await.unwrap();
    checkins.start("bob", Some(5), "").await.unwrap();
    h.clock.advance(Duration::minutes(6));

    sqlx::query("ALTER TABLE relationships RENAME TO relationships_offline")
        .execute(h.db.pool())
        .await
        .unwrap();
    let alerted = checkins.sweep_now().await.unwrap();
    assert!(alerted.is_empty());
    assert!(checkins.active("alice").await.unwrap().is_some());
    assert!(checkins.active("bob").await.unwrap().is_some());

    sqlx::query("ALTER TABLE relationships_offline RENAME TO relationships")
        .execute(h.db.pool())
        .await
        .unwrap();
    let alerted = checkins.sweep_now().await.unwrap();
    assert_eq!(alerted.len(), 2);

    let notified = h.sink.of_kind(PushEventKind::CheckInAlerted);
    assert_eq!(notified.len(), 2);
}

struct UnreachableSink;

#[async_trait]
impl PushSink for UnreachableSink {
    async fn dispatch(&self, _event: PushEvent) -> Result<(), PushError> {
        Err(PushError("gateway down".to_string()))
    }
}

#[tokio::test]
async fn test_push_failure_does_not_stop_sweep() {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let engine = Engine::new(
        db,
        EngineConfig::default(),
        clock.clone(),
        Arc::new(UnreachableSink),
    );
    for name in ["alice", "bob"] {
        engine.profiles().ensure(name, Some(name)).await.unwrap();
    }
    let request = engine.relationships().create_request("alice", "bob").await.unwrap();
    engine
        .relationships()
        .respond(&request.id, "bob", RespondAction::Accept)
        .await
        .unwrap();

    let checkins = engine.checkins();
    checkins.start("alice", Some(5), "").await.unwrap();
    checkins.start("bob", Some(5), "").await.unwrap();
    clock.advance(Duration::minutes(6));

    let alerted = checkins.sweep_now().await.unwrap();
    assert_eq!(alerted.len(), 2);
    assert!(alerted.iter().all(|s| s.status == CheckInStatus::Alerted));
    assert!(checkins.sweep_now().await.unwrap().is_empty());
}
