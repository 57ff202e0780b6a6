//! Ping authorization and lifecycle.
//!
//! Admission runs, in order: accepted relationship, VIP gate (gated classes),
//! daily quota (limited classes), then the insert. Quota check and insert
//! share one transaction and, for limited classes, a per-pair lock, so the
//! limit holds under concurrent sends within one process.

use std::sync::Arc;

use database::validation::{
    validate_battery_level, validate_location, validate_message, validate_ping_type,
    validate_required, MAX_RESPONSE_LENGTH,
};
use database::{ping, relationship, Database, NewPing, Ping, RelationshipStatus};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{fire_and_forget, PushEvent, PushEventKind, PushSink};
use crate::ping_type::PingType;
use crate::rate_limit::{DailyUsage, PairLocks, PairQuota, RateDecision, RateLimiter};
use crate::vip::is_vip;

/// Longest opaque media reference accepted.
const MAX_AUDIO_REFERENCE_LENGTH: usize = 1024;

/// A request to send a ping.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendPing {
    pub receiver_id: String,
    pub ping_type: String,
    pub message: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Reference returned by the media store for an uploaded clip.
    #[serde(default)]
    pub audio_reference: Option<String>,
    #[serde(default)]
    pub battery_level: Option<i64>,
}

impl SendPing {
    /// A ping with only the required fields.
    pub fn new(
        receiver_id: impl Into<String>,
        ping_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            receiver_id: receiver_id.into(),
            ping_type: ping_type.into(),
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Admits pings and drives them from sent to delivered.
#[derive(Clone)]
pub struct Pings {
    db: Database,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    sink: Arc<dyn PushSink>,
    locks: Arc<PairLocks>,
    history_limit: i64,
}

impl Pings {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        limiter: RateLimiter,
        sink: Arc<dyn PushSink>,
        history_limit: i64,
    ) -> Self {
        Self {
            db,
            clock,
            limiter,
            sink,
            locks: Arc::new(PairLocks::default()),
            history_limit,
        }
    }

    /// Authorize and persist a ping from `sender_id`.
    pub async fn send(&self, sender_id: &str, request: SendPing) -> Result<Ping> {
        let new_ping = self.build(sender_id, request)?;
        let ping_type = PingType::from_code(&new_ping.ping_type);
        let receiver_id = new_ping.receiver_id.clone();

        let _pair_guard = if ping_type.is_rate_limited() {
            Some(self.locks.acquire(sender_id, &receiver_id).await)
        } else {
            None
        };

        let mut tx = self.db.begin_write().await?;

        let friendship = relationship::find_by_pair(&mut *tx, sender_id, &receiver_id)
            .await?
            .filter(|r| r.status == RelationshipStatus::Accepted)
            .ok_or(CoreError::NotFriends)?;

        // The receiver must have granted the sender VIP trust, not the reverse.
        if ping_type.is_vip_gated() && !is_vip(&friendship, &receiver_id, sender_id) {
            return Err(CoreError::NotVip);
        }

        let decision = self
            .limiter
            .check(&mut *tx, sender_id, &receiver_id, &ping_type, new_ping.created_at)
            .await?;
        if let RateDecision::Deny { limit } = decision {
            info!(sender = %sender_id, receiver = %receiver_id, limit, "Ping rate limited");
            return Err(CoreError::RateLimited {
                ping_type: ping_type.to_string(),
                limit,
            });
        }

        ping::insert(&mut *tx, &new_ping).await?;
        let stored = ping::get(&mut *tx, &new_ping.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ping"))?;
        tx.commit().await?;

        info!(
            ping_id = %stored.id,
            sender = %sender_id,
            receiver = %receiver_id,
            ping_type = %stored.ping_type,
            "Ping sent"
        );

        fire_and_forget(
            self.sink.as_ref(),
            PushEvent::new(
                &stored.receiver_id,
                PushEventKind::PingCreated,
                json!({
                    "ping_id": stored.id,
                    "sender_id": stored.sender_id,
                    "ping_type": stored.ping_type,
                    "message": stored.message,
                    "latitude": stored.latitude,
                    "longitude": stored.longitude,
                    "audio_reference": stored.audio_reference,
                    "battery_level": stored.battery_level,
                }),
            ),
        )
        .await;

        Ok(stored)
    }

    /// Receiver confirms the ping reached the device.
    ///
    /// Repeating the call re-stamps `delivered_at` with the current time.
    pub async fn mark_delivered(&self, ping_id: &str, caller: &str) -> Result<Ping> {
        let existing = self.load(ping_id).await?;
        if existing.receiver_id != caller {
            return Err(CoreError::Forbidden(
                "only the receiver can confirm delivery".to_string(),
            ));
        }

        let now = self.clock.now();
        ping::mark_delivered(self.db.pool(), ping_id, now).await?;
        let updated = self.load(ping_id).await?;

        info!(ping_id = %ping_id, receiver = %caller, "Ping delivered");
        fire_and_forget(
            self.sink.as_ref(),
            PushEvent::new(
                &updated.sender_id,
                PushEventKind::PingDelivered,
                json!({ "ping_id": updated.id, "delivered_at": updated.delivered_at }),
            ),
        )
        .await;

        Ok(updated)
    }

    /// Receiver attaches the one-time reply to a ping.
    ///
    /// Independent of delivery status.
    pub async fn handshake(&self, ping_id: &str, caller: &str, response: &str) -> Result<Ping> {
        let response = validate_required("response", response, MAX_RESPONSE_LENGTH)?;

        let existing = self.load(ping_id).await?;
        if existing.receiver_id != caller {
            return Err(CoreError::Forbidden(
                "only the receiver can respond to a ping".to_string(),
            ));
        }

        let now = self.clock.now();
        if !ping::record_response(self.db.pool(), ping_id, &response, now).await? {
            return Err(CoreError::Forbidden(
                "a response was already recorded for this ping".to_string(),
            ));
        }
        let updated = self.load(ping_id).await?;

        info!(ping_id = %ping_id, receiver = %caller, "Handshake recorded");
        fire_and_forget(
            self.sink.as_ref(),
            PushEvent::new(
                &updated.sender_id,
                PushEventKind::HandshakeReceived,
                json!({
                    "ping_id": updated.id,
                    "response_message": updated.response_message,
                    "response_at": updated.response_at,
                }),
            ),
        )
        .await;

        Ok(updated)
    }

    /// A ping visible to `caller`. Strangers see it as missing.
    pub async fn get(&self, ping_id: &str, caller: &str) -> Result<Ping> {
        let found = self.load(ping_id).await?;
        if found.sender_id != caller && found.receiver_id != caller {
            return Err(CoreError::not_found("Ping"));
        }
        Ok(found)
    }

    /// Recent pings the user sent or received, newest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<Ping>> {
        Ok(ping::history_for_user(self.db.pool(), user_id, self.history_limit).await?)
    }

    /// Emergency quota between `sender_id` and one friend, for today.
    pub async fn pair_quota(&self, sender_id: &str, receiver_id: &str) -> Result<PairQuota> {
        self.limiter
            .pair_quota(self.db.pool(), sender_id, receiver_id, self.clock.now())
            .await
    }

    /// Emergency pings `sender_id` sent today across all friends.
    pub async fn daily_usage(&self, sender_id: &str) -> Result<DailyUsage> {
        self.limiter
            .daily_usage(self.db.pool(), sender_id, self.clock.now())
            .await
    }

    async fn load(&self, ping_id: &str) -> Result<Ping> {
        ping::get(self.db.pool(), ping_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ping"))
    }

    fn build(&self, sender_id: &str, request: SendPing) -> Result<NewPing> {
        let ping_type = validate_ping_type(&request.ping_type)?;
        validate_message(&request.message)?;
        let location = validate_location(request.latitude, request.longitude)?;
        let battery_level = request
            .battery_level
            .map(validate_battery_level)
            .transpose()?;
        let audio_reference = request
            .audio_reference
            .as_deref()
            .map(|r| validate_required("audio_reference", r, MAX_AUDIO_REFERENCE_LENGTH))
            .transpose()?;

        if request.receiver_id == sender_id {
            return Err(CoreError::SelfRequest);
        }

        Ok(NewPing {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: request.receiver_id,
            ping_type,
            message: request.message,
            created_at: self.clock.now(),
            latitude: location.map(|(lat, _)| lat),
            longitude: location.map(|(_, lon)| lon),
            audio_reference,
            battery_level,
        })
    }
}
