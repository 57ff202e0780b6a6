//! Relationship and ping-authorization engine.
//!
//! This crate provides the [`Engine`] type, which bundles the rules of the
//! friend-alerting backend:
//!
//! - [`Relationships`]: friend requests, accept/decline, unfriend, block,
//!   per-direction VIP grants and ringtones
//! - [`vip::is_vip`]: the directional VIP gate
//! - [`RateLimiter`]: the daily per-pair emergency quota
//! - [`Pings`]: ping admission, delivery receipts and handshakes
//! - [`CheckIns`]: single-active-timer check-ins and the expiry sweep
//! - [`Profiles`]: status, nickname, push token and user search
//!
//! # Architecture
//!
//! ```text
//! send ping
//!     ↓
//! ┌─────────────────────────────────────────────┐
//! │  1. Relationship must be accepted           │ → NotFriends
//! │  2. Gated class? receiver's VIP grant       │ → NotVip
//! │  3. Limited class? today's pair quota       │ → RateLimited
//! │  4. Insert (status = sent)                  │
//! └─────────────────────────────────────────────┘
//!     ↓
//! PushSink (ping_created → receiver)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use safety_core::{Engine, EngineConfig, LoggingSink, SendPing, SystemClock};
//!
//! let db = database::Database::connect("sqlite:safety.db?mode=rwc").await?;
//! db.migrate().await?;
//! let engine = Engine::new(db, EngineConfig::from_env(), Arc::new(SystemClock), Arc::new(LoggingSink));
//!
//! let ping = engine
//!     .pings()
//!     .send("alice", SendPing::new("bob", "status", "home safe"))
//!     .await?;
//! ```

pub mod checkin;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ping_type;
pub mod pings;
pub mod profiles;
pub mod rate_limit;
pub mod relationships;
pub mod role;
pub mod vip;

use std::sync::Arc;

use database::Database;

pub use checkin::CheckIns;
pub use clock::{Clock, DayPolicy, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use events::{
    LoggingSink, NoOpSink, PushError, PushEvent, PushEventKind, PushSink, RecordingSink,
};
pub use ping_type::PingType;
pub use pings::{Pings, SendPing};
pub use profiles::Profiles;
pub use rate_limit::{DailyUsage, PairQuota, RateDecision, RateLimiter};
pub use relationships::{FriendEntry, Relationships, RespondAction};
pub use role::{role_of, Role};

/// All engine components wired to one database, clock and push sink.
#[derive(Clone)]
pub struct Engine {
    relationships: Relationships,
    pings: Pings,
    checkins: CheckIns,
    profiles: Profiles,
}

impl Engine {
    pub fn new(
        db: Database,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn PushSink>,
    ) -> Self {
        let limiter = RateLimiter::new(config.emergency_daily_limit, config.day_policy);

        Self {
            relationships: Relationships::new(db.clone(), clock.clone()),
            pings: Pings::new(
                db.clone(),
                clock.clone(),
                limiter,
                sink.clone(),
                config.history_limit,
            ),
            checkins: CheckIns::new(
                db.clone(),
                clock,
                sink,
                config.default_checkin_minutes,
                config.sweep_batch_size,
            ),
            profiles: Profiles::new(db, config.search_limit),
        }
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn pings(&self) -> &Pings {
        &self.pings
    }

    pub fn checkins(&self) -> &CheckIns {
        &self.checkins
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }
}
