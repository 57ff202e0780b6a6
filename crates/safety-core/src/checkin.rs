//! Check-in timers (dead-man's switch).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use database::validation::{validate_duration_minutes, validate_optional};
use database::{checkin, relationship, CheckInSession, CheckInStatus, Database, RelationshipStatus};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::{fire_and_forget, PushEvent, PushEventKind, PushSink};

/// Longest message attached to a check-in.
const MAX_CHECKIN_MESSAGE_LENGTH: usize = 1000;

/// Starts, clears and expires check-in sessions.
#[derive(Clone)]
pub struct CheckIns {
    db: Database,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn PushSink>,
    default_minutes: i64,
    sweep_batch_size: i64,
}

impl CheckIns {
    pub fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn PushSink>,
        default_minutes: i64,
        sweep_batch_size: i64,
    ) -> Self {
        Self {
            db,
            clock,
            sink,
            default_minutes,
            sweep_batch_size,
        }
    }

    /// Start a new timer, retiring any active one in the same transaction.
    pub async fn start(
        &self,
        user_id: &str,
        duration_minutes: Option<i64>,
        message: &str,
    ) -> Result<CheckInSession> {
        let minutes = validate_duration_minutes(duration_minutes.unwrap_or(self.default_minutes))?;
        let message = validate_optional("message", message, MAX_CHECKIN_MESSAGE_LENGTH)?;

        let started_at = self.clock.now();
        let session = CheckInSession {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            started_at,
            expires_at: started_at + Duration::minutes(minutes),
            status: CheckInStatus::Active,
            message,
        };

        let mut tx = self.db.begin_write().await?;
        let retired = checkin::deactivate_active(&mut *tx, user_id).await?;
        checkin::insert(&mut *tx, &session).await?;
        tx.commit().await?;

        info!(
            session_id = %session.id,
            user_id = %user_id,
            expires_at = %session.expires_at,
            retired,
            "Check-in started"
        );
        Ok(session)
    }

    /// Mark the user safe. Returns how many sessions were active; zero is fine.
    pub async fn mark_safe(&self, user_id: &str) -> Result<u64> {
        let cleared = checkin::deactivate_active(self.db.pool(), user_id).await?;
        info!(user_id = %user_id, cleared, "Marked safe");
        Ok(cleared)
    }

    /// The user's running timer, if any.
    pub async fn active(&self, user_id: &str) -> Result<Option<CheckInSession>> {
        Ok(checkin::get_active(self.db.pool(), user_id).await?)
    }

    /// Alert every active session whose deadline passed before `now`.
    ///
    /// Each session is alerted once even when sweeps overlap. Friends of the
    /// user receive the session message. A session whose friends cannot be
    /// loaded stays active for the next sweep, and the rest of the batch
    /// still runs. Returns the sessions alerted here.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<CheckInSession>> {
        let expired = checkin::list_expired_active(self.db.pool(), now, self.sweep_batch_size).await?;

        let mut alerted = Vec::with_capacity(expired.len());
        for mut session in expired {
            let friends = match self.friends_of(&session.user_id).await {
                Ok(friends) => friends,
                Err(err) => {
                    error!(
                        session_id = %session.id,
                        user_id = %session.user_id,
                        error = %err,
                        "Could not load friends for expired check-in"
                    );
                    continue;
                }
            };

            match checkin::mark_alerted(self.db.pool(), &session.id).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    error!(session_id = %session.id, error = %err, "Could not mark check-in alerted");
                    continue;
                }
            }
            session.status = CheckInStatus::Alerted;

            info!(
                session_id = %session.id,
                user_id = %session.user_id,
                expires_at = %session.expires_at,
                friends = friends.len(),
                "Check-in expired"
            );
            self.notify_friends(&session, &friends).await;
            alerted.push(session);
        }

        Ok(alerted)
    }

    /// Sweep using the engine clock.
    pub async fn sweep_now(&self) -> Result<Vec<CheckInSession>> {
        self.sweep_expired(self.clock.now()).await
    }

    async fn friends_of(&self, user_id: &str) -> Result<Vec<String>> {
        let friendships =
            relationship::list_for_user(self.db.pool(), user_id, RelationshipStatus::Accepted)
                .await?;

        Ok(friendships
            .iter()
            .filter_map(|friendship| friendship.other_party(user_id))
            .map(str::to_string)
            .collect())
    }

    async fn notify_friends(&self, session: &CheckInSession, friends: &[String]) {
        for friend_id in friends {
            fire_and_forget(
                self.sink.as_ref(),
                PushEvent::new(
                    friend_id.as_str(),
                    PushEventKind::CheckInAlerted,
                    json!({
                        "session_id": session.id,
                        "user_id": session.user_id,
                        "message": session.message,
                        "expires_at": session.expires_at,
                    }),
                ),
            )
            .await;
        }
    }
}
