//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use database::{Database, Relationship};
use safety_core::{Engine, EngineConfig, ManualClock, RecordingSink, RespondAction};

pub struct Harness {
    pub db: Database,
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
}

/// 2026-03-02 10:00 UTC, mid-morning so same-day arithmetic has room.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

/// In-memory engine with users alice, bob and carol registered.
pub async fn harness() -> Harness {
    harness_with(EngineConfig::default()).await
}

pub async fn harness_with(config: EngineConfig) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    let sink = Arc::new(RecordingSink::new());
    let engine = Engine::new(db.clone(), config, clock.clone(), sink.clone());

    for name in ["alice", "bob", "carol"] {
        engine.profiles().ensure(name, Some(name)).await.unwrap();
    }

    Harness {
        db,
        engine,
        clock,
        sink,
    }
}

/// `initiator` requests, `counterpart` accepts.
pub async fn befriend(h: &Harness, initiator: &str, counterpart: &str) -> Relationship {
    let request = h
        .engine
        .relationships()
        .create_request(initiator, counterpart)
        .await
        .unwrap();
    h.engine
        .relationships()
        .respond(&request.id, counterpart, RespondAction::Accept)
        .await
        .unwrap()
}

/// Friends where `receiver` has granted `sender` VIP trust.
pub async fn vip_friends(h: &Harness, sender: &str, receiver: &str) -> Relationship {
    befriend(h, sender, receiver).await;
    h.engine
        .relationships()
        .set_vip(receiver, sender, true)
        .await
        .unwrap()
}
