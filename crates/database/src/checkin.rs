//! Check-in session store.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::error::{DatabaseError, Result};
use crate::models::CheckInSession;

/// Move every active session of a user to `safe`. Returns how many moved.
pub async fn deactivate_active<'e, E>(executor: E, user_id: &str) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE checkin_sessions
        SET status = 'safe'
        WHERE user_id = ? AND status = 'active'
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Insert a session.
///
/// The partial unique index rejects a second active session for the same user.
pub async fn insert<'e, E>(executor: E, session: &CheckInSession) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO checkin_sessions (id, user_id, started_at, expires_at, status, message)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.user_id)
    .bind(session.started_at)
    .bind(session.expires_at)
    .bind(session.status)
    .bind(&session.message)
    .execute(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "CheckInSession", session.user_id.clone()))?;

    Ok(())
}

/// Get the active session of a user, if any.
pub async fn get_active<'e, E>(executor: E, user_id: &str) -> Result<Option<CheckInSession>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, CheckInSession>(
        r#"
        SELECT id, user_id, started_at, expires_at, status, message
        FROM checkin_sessions
        WHERE user_id = ? AND status = 'active'
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(record)
}

/// List sessions of a user, newest first.
pub async fn list_for_user<'e, E>(executor: E, user_id: &str) -> Result<Vec<CheckInSession>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, CheckInSession>(
        r#"
        SELECT id, user_id, started_at, expires_at, status, message
        FROM checkin_sessions
        WHERE user_id = ?
        ORDER BY started_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Active sessions whose deadline passed before `now`.
pub async fn list_expired_active<'e, E>(
    executor: E,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<CheckInSession>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, CheckInSession>(
        r#"
        SELECT id, user_id, started_at, expires_at, status, message
        FROM checkin_sessions
        WHERE status = 'active' AND expires_at < ?
        ORDER BY expires_at
        LIMIT ?
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Move one session from `active` to `alerted`.
///
/// Returns false if it was no longer active (marked safe, or alerted by a
/// concurrent sweep).
pub async fn mark_alerted<'e, E>(executor: E, id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE checkin_sessions
        SET status = 'alerted'
        WHERE id = ? AND status = 'active'
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
