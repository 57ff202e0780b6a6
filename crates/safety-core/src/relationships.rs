//! Relationship state machine.
//!
//! ```text
//!            create_request            respond(accept)
//!   (none) ─────────────────► pending ─────────────────► accepted
//!     │                          │ respond(decline)
//!     │                          └─────────────────────► declined
//!     │ block
//!     └──────────────────────► blocked ◄── block (from any state)
//! ```
//!
//! Unfriend deletes any non-blocked record. A blocked record only goes away
//! when the blocking party unblocks.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::relationship;
use database::validation::{validate_required, ValidationError, MAX_RINGTONE_LENGTH};
use database::{user, Database, DatabaseError, Relationship, RelationshipStatus, User};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::role::role_of;
use crate::vip::is_vip;

/// Default ringtone for new records.
pub const DEFAULT_RINGTONE: &str = "default";

/// Answer to a pending friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondAction {
    Accept,
    Decline,
}

impl RespondAction {
    fn target_status(&self) -> RelationshipStatus {
        match self {
            RespondAction::Accept => RelationshipStatus::Accepted,
            RespondAction::Decline => RelationshipStatus::Declined,
        }
    }
}

impl FromStr for RespondAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(RespondAction::Accept),
            "decline" => Ok(RespondAction::Decline),
            other => Err(ValidationError::InvalidChoice {
                field: "action".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// An accepted friend as seen from one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendEntry {
    pub relationship_id: String,
    pub friend: User,
    /// Whether the viewing user considers this friend a VIP.
    pub is_vip: bool,
    pub ringtone: String,
    pub since: DateTime<Utc>,
}

/// Applies relationship transitions against the store.
#[derive(Debug, Clone)]
pub struct Relationships {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl Relationships {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Send a friend request from `initiator` to `counterpart`.
    pub async fn create_request(&self, initiator: &str, counterpart: &str) -> Result<Relationship> {
        if initiator == counterpart {
            return Err(CoreError::SelfRequest);
        }
        self.require_user(counterpart).await?;

        let record = self.new_record(initiator, counterpart, RelationshipStatus::Pending, None);
        relationship::insert(self.db.pool(), &record)
            .await
            .map_err(duplicate_on_conflict)?;

        info!(
            relationship_id = %record.id,
            initiator = %initiator,
            counterpart = %counterpart,
            "Friend request created"
        );
        Ok(record)
    }

    /// Accept or decline a pending request. Only the counterpart may answer.
    pub async fn respond(
        &self,
        relationship_id: &str,
        responder: &str,
        action: RespondAction,
    ) -> Result<Relationship> {
        let mut tx = self.db.begin_write().await?;

        let resolved =
            relationship::resolve_pending(&mut *tx, relationship_id, responder, action.target_status())
                .await?;
        if !resolved {
            return Err(CoreError::not_found("Friend request"));
        }
        let record = relationship::get(&mut *tx, relationship_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friend request"))?;

        tx.commit().await?;

        info!(
            relationship_id = %relationship_id,
            responder = %responder,
            status = record.status.as_str(),
            "Friend request answered"
        );
        Ok(record)
    }

    /// Remove the connection with `other`. Blocked pairs cannot be unfriended.
    pub async fn unfriend(&self, user_id: &str, other: &str) -> Result<()> {
        let removed = relationship::delete_unblocked(self.db.pool(), user_id, other).await?;
        if !removed {
            return Err(CoreError::not_found("Friendship"));
        }

        info!(user_id = %user_id, other = %other, "Friendship removed");
        Ok(())
    }

    /// Block `other`, creating a record if the pair has none.
    pub async fn block(&self, user_id: &str, other: &str) -> Result<Relationship> {
        if user_id == other {
            return Err(CoreError::SelfRequest);
        }
        self.require_user(other).await?;

        let mut tx = self.db.begin_write().await?;

        // A concurrent create for the same pair can win the insert; the second
        // pass then finds its record and overwrites it.
        let mut blocked_id = None;
        for _ in 0..2 {
            if let Some(existing) = relationship::find_by_pair(&mut *tx, user_id, other).await? {
                relationship::mark_blocked(&mut *tx, &existing.id, user_id).await?;
                blocked_id = Some(existing.id);
                break;
            }

            let record =
                self.new_record(user_id, other, RelationshipStatus::Blocked, Some(user_id));
            match relationship::insert(&mut *tx, &record).await {
                Ok(()) => {
                    blocked_id = Some(record.id);
                    break;
                }
                Err(DatabaseError::AlreadyExists { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let blocked_id = blocked_id.ok_or(CoreError::DuplicateRelationship)?;
        let record = relationship::get(&mut *tx, &blocked_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Relationship"))?;
        tx.commit().await?;

        info!(relationship_id = %record.id, blocked_by = %user_id, blocked = %other, "User blocked");
        Ok(record)
    }

    /// Lift a block. Only the party who blocked may do this; the record is deleted.
    pub async fn unblock(&self, user_id: &str, other: &str) -> Result<()> {
        let removed = relationship::delete_blocked_by(self.db.pool(), user_id, other, user_id).await?;
        if !removed {
            return Err(CoreError::not_found("Block"));
        }

        info!(user_id = %user_id, other = %other, "User unblocked");
        Ok(())
    }

    /// Grant or revoke `user_id`'s VIP trust toward `other`.
    ///
    /// Writes only the flag owned by `user_id`.
    pub async fn set_vip(&self, user_id: &str, other: &str, is_vip: bool) -> Result<Relationship> {
        let mut tx = self.db.begin_write().await?;

        let record = accepted_pair(&mut tx, user_id, other).await?;
        let role = role_of(&record, user_id).ok_or_else(|| CoreError::not_found("Friendship"))?;

        let written =
            relationship::set_vip_flag(&mut *tx, &record.id, role.own_vip_flag(), is_vip).await?;
        if !written {
            return Err(CoreError::not_found("Friendship"));
        }
        let record = relationship::get(&mut *tx, &record.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friendship"))?;
        tx.commit().await?;

        info!(relationship_id = %record.id, grantor = %user_id, is_vip, "VIP flag updated");
        Ok(record)
    }

    /// Set the shared ringtone for an accepted friendship.
    pub async fn set_ringtone(&self, user_id: &str, other: &str, ringtone: &str) -> Result<Relationship> {
        let ringtone = validate_required("ringtone", ringtone, MAX_RINGTONE_LENGTH)?;
        let mut tx = self.db.begin_write().await?;

        let record = accepted_pair(&mut tx, user_id, other).await?;
        if !relationship::set_ringtone(&mut *tx, &record.id, &ringtone).await? {
            return Err(CoreError::not_found("Friendship"));
        }
        let record = relationship::get(&mut *tx, &record.id)
            .await?
            .ok_or_else(|| CoreError::not_found("Friendship"))?;
        tx.commit().await?;

        info!(relationship_id = %record.id, ringtone = %record.ringtone, "Ringtone updated");
        Ok(record)
    }

    /// The pair's record, whatever its status.
    pub async fn between(&self, a: &str, b: &str) -> Result<Option<Relationship>> {
        Ok(relationship::find_by_pair(self.db.pool(), a, b).await?)
    }

    /// Accepted friends of `user_id`, with the viewer's outgoing VIP flag.
    pub async fn list_friends(&self, user_id: &str) -> Result<Vec<FriendEntry>> {
        let records =
            relationship::list_for_user(self.db.pool(), user_id, RelationshipStatus::Accepted).await?;

        let mut friends = Vec::with_capacity(records.len());
        for record in records {
            let Some(friend_id) = record.other_party(user_id) else {
                continue;
            };
            let friend = user::get_user(self.db.pool(), friend_id).await?;
            friends.push(FriendEntry {
                is_vip: is_vip(&record, user_id, friend_id),
                relationship_id: record.id.clone(),
                ringtone: record.ringtone.clone(),
                since: record.created_at,
                friend,
            });
        }
        Ok(friends)
    }

    /// Pending requests the user sent or received, newest first.
    pub async fn list_pending(&self, user_id: &str) -> Result<Vec<Relationship>> {
        Ok(relationship::list_for_user(self.db.pool(), user_id, RelationshipStatus::Pending).await?)
    }

    async fn require_user(&self, user_id: &str) -> Result<()> {
        if !user::user_exists(self.db.pool(), user_id).await? {
            return Err(CoreError::not_found("User"));
        }
        Ok(())
    }

    fn new_record(
        &self,
        initiator: &str,
        counterpart: &str,
        status: RelationshipStatus,
        blocked_by: Option<&str>,
    ) -> Relationship {
        Relationship {
            id: Uuid::new_v4().to_string(),
            initiator_id: initiator.to_string(),
            counterpart_id: counterpart.to_string(),
            status,
            created_at: self.clock.now(),
            blocked_by: blocked_by.map(str::to_string),
            ringtone: DEFAULT_RINGTONE.to_string(),
            initiator_marks_counterpart_vip: false,
            counterpart_marks_initiator_vip: false,
        }
    }
}

async fn accepted_pair(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    a: &str,
    b: &str,
) -> Result<Relationship> {
    relationship::find_by_pair(&mut **tx, a, b)
        .await?
        .filter(|r| r.status == RelationshipStatus::Accepted)
        .ok_or_else(|| CoreError::not_found("Friendship"))
}

fn duplicate_on_conflict(err: DatabaseError) -> CoreError {
    match err {
        DatabaseError::AlreadyExists { .. } => CoreError::DuplicateRelationship,
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_respond_action() {
        assert_eq!("accept".parse::<RespondAction>().unwrap(), RespondAction::Accept);
        assert_eq!(" Decline ".parse::<RespondAction>().unwrap(), RespondAction::Decline);
        assert!(matches!(
            "ignore".parse::<RespondAction>(),
            Err(ValidationError::InvalidChoice { .. })
        ));
    }
}
