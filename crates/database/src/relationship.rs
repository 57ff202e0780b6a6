//! Relationship store.
//!
//! Every function accepts any SQLite executor, so callers can run them against
//! the pool or inside a transaction.

use sqlx::{Executor, Sqlite};

use crate::error::{DatabaseError, Result};
use crate::models::{Relationship, RelationshipStatus};

const COLUMNS: &str = "id, initiator_id, counterpart_id, status, created_at, blocked_by, \
     ringtone, initiator_marks_counterpart_vip, counterpart_marks_initiator_vip";

/// Order two user ids so that both orderings of a pair map to the same key.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Which of the two directional VIP flags to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VipFlag {
    /// Owned by the initiator: "initiator considers counterpart a VIP".
    InitiatorMarksCounterpart,
    /// Owned by the counterpart: "counterpart considers initiator a VIP".
    CounterpartMarksInitiator,
}

impl VipFlag {
    /// Get the database column name for this flag.
    pub fn column_name(&self) -> &'static str {
        match self {
            VipFlag::InitiatorMarksCounterpart => "initiator_marks_counterpart_vip",
            VipFlag::CounterpartMarksInitiator => "counterpart_marks_initiator_vip",
        }
    }
}

/// Insert a new relationship record.
///
/// Fails with [`DatabaseError::AlreadyExists`] when the unordered pair already
/// has a record, whatever its status.
pub async fn insert<'e, E>(executor: E, relationship: &Relationship) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (low, high) = canonical_pair(&relationship.initiator_id, &relationship.counterpart_id);

    sqlx::query(
        r#"
        INSERT INTO relationships (
            id, initiator_id, counterpart_id, pair_low, pair_high, status, created_at,
            blocked_by, ringtone, initiator_marks_counterpart_vip, counterpart_marks_initiator_vip
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&relationship.id)
    .bind(&relationship.initiator_id)
    .bind(&relationship.counterpart_id)
    .bind(low)
    .bind(high)
    .bind(relationship.status)
    .bind(relationship.created_at)
    .bind(&relationship.blocked_by)
    .bind(&relationship.ringtone)
    .bind(relationship.initiator_marks_counterpart_vip)
    .bind(relationship.counterpart_marks_initiator_vip)
    .execute(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Relationship", format!("{}/{}", low, high)))?;

    Ok(())
}

/// Get a relationship by ID.
pub async fn get<'e, E>(executor: E, id: &str) -> Result<Option<Relationship>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!("SELECT {COLUMNS} FROM relationships WHERE id = ?");
    let record = sqlx::query_as::<_, Relationship>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(record)
}

/// Find the record for an unordered pair of users.
pub async fn find_by_pair<'e, E>(executor: E, a: &str, b: &str) -> Result<Option<Relationship>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (low, high) = canonical_pair(a, b);
    let query = format!("SELECT {COLUMNS} FROM relationships WHERE pair_low = ? AND pair_high = ?");
    let record = sqlx::query_as::<_, Relationship>(&query)
        .bind(low)
        .bind(high)
        .fetch_optional(executor)
        .await?;

    Ok(record)
}

/// Resolve a pending request addressed to `counterpart_id`.
///
/// Returns false when no pending record with that id is addressed to them.
pub async fn resolve_pending<'e, E>(
    executor: E,
    id: &str,
    counterpart_id: &str,
    status: RelationshipStatus,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE relationships
        SET status = ?
        WHERE id = ? AND counterpart_id = ? AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(id)
    .bind(counterpart_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Overwrite a record to blocked. VIP grants do not survive a block.
pub async fn mark_blocked<'e, E>(executor: E, id: &str, blocked_by: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE relationships
        SET status = 'blocked',
            blocked_by = ?,
            initiator_marks_counterpart_vip = 0,
            counterpart_marks_initiator_vip = 0
        WHERE id = ?
        "#,
    )
    .bind(blocked_by)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write one VIP flag on an accepted record.
///
/// Returns false if the record is gone or no longer accepted.
pub async fn set_vip_flag<'e, E>(executor: E, id: &str, flag: VipFlag, value: bool) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    // Column name comes from the VipFlag enum, never from input.
    let query = format!(
        "UPDATE relationships SET {column} = ? WHERE id = ? AND status = 'accepted'",
        column = flag.column_name()
    );

    let result = sqlx::query(&query)
        .bind(value)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Write the shared ringtone on an accepted record.
pub async fn set_ringtone<'e, E>(executor: E, id: &str, ringtone: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE relationships
        SET ringtone = ?
        WHERE id = ? AND status = 'accepted'
        "#,
    )
    .bind(ringtone)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete the pair's record unless it is blocked.
pub async fn delete_unblocked<'e, E>(executor: E, a: &str, b: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (low, high) = canonical_pair(a, b);
    let result = sqlx::query(
        r#"
        DELETE FROM relationships
        WHERE pair_low = ? AND pair_high = ? AND status <> 'blocked'
        "#,
    )
    .bind(low)
    .bind(high)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete the pair's record if it was blocked by `blocked_by`.
pub async fn delete_blocked_by<'e, E>(executor: E, a: &str, b: &str, blocked_by: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (low, high) = canonical_pair(a, b);
    let result = sqlx::query(
        r#"
        DELETE FROM relationships
        WHERE pair_low = ? AND pair_high = ? AND status = 'blocked' AND blocked_by = ?
        "#,
    )
    .bind(low)
    .bind(high)
    .bind(blocked_by)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List a user's records with the given status, newest first.
pub async fn list_for_user<'e, E>(
    executor: E,
    user_id: &str,
    status: RelationshipStatus,
) -> Result<Vec<Relationship>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!(
        "SELECT {COLUMNS} FROM relationships \
         WHERE (initiator_id = ? OR counterpart_id = ?) AND status = ? \
         ORDER BY created_at DESC"
    );
    let rows = sqlx::query_as::<_, Relationship>(&query)
        .bind(user_id)
        .bind(user_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}
