//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user, identified by the opaque id the identity provider hands us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Login name, used for search.
    pub username: String,
    /// Display nickname (may be empty).
    pub nickname: String,
    /// Availability status (e.g., "available", "driving").
    pub status: String,
    /// Push notification target, if the device registered one.
    pub fcm_token: Option<String>,
}

/// Relationship status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Pending,
    Accepted,
    Declined,
    Blocked,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Pending => "pending",
            RelationshipStatus::Accepted => "accepted",
            RelationshipStatus::Declined => "declined",
            RelationshipStatus::Blocked => "blocked",
        }
    }
}

/// A pairwise connection between two users.
///
/// The pair is unordered for lookup, but `initiator_id`/`counterpart_id` are
/// fixed at creation and decide which VIP flag belongs to which party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Relationship {
    pub id: String,
    /// User who created the record (sent the request, or blocked first).
    pub initiator_id: String,
    /// The other party.
    pub counterpart_id: String,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
    /// Set only while `status` is blocked.
    pub blocked_by: Option<String>,
    /// Shared ringtone identifier.
    pub ringtone: String,
    /// Initiator considers the counterpart a VIP.
    pub initiator_marks_counterpart_vip: bool,
    /// Counterpart considers the initiator a VIP.
    pub counterpart_marks_initiator_vip: bool,
}

impl Relationship {
    /// Whether `user_id` is one of the two parties.
    pub fn involves(&self, user_id: &str) -> bool {
        self.initiator_id == user_id || self.counterpart_id == user_id
    }

    /// The party that is not `user_id`.
    pub fn other_party(&self, user_id: &str) -> Option<&str> {
        if self.initiator_id == user_id {
            Some(&self.counterpart_id)
        } else if self.counterpart_id == user_id {
            Some(&self.initiator_id)
        } else {
            None
        }
    }
}

/// Ping delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Sent,
    Delivered,
}

/// A message sent from one user to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Ping {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// String-coded class (e.g., "emergency", "battery", "status").
    pub ping_type: String,
    pub message: String,
    pub status: PingStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Opaque media reference for an audio attachment.
    pub audio_reference: Option<String>,
    pub battery_level: Option<i64>,
    /// Handshake reply from the receiver.
    pub response_message: Option<String>,
    pub response_at: Option<DateTime<Utc>>,
}

/// Fields for a ping about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPing {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub ping_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub audio_reference: Option<String>,
    pub battery_level: Option<i64>,
}

/// Check-in session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckInStatus {
    Active,
    Safe,
    Alerted,
}

/// A dead-man's-switch timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CheckInSession {
    pub id: String,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: CheckInStatus,
    /// Broadcast to friends if the timer expires unacknowledged.
    pub message: String,
}
