//! Ping (message) store.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::error::{DatabaseError, Result};
use crate::models::{NewPing, Ping};

const COLUMNS: &str = "id, sender_id, receiver_id, ping_type, message, status, created_at, \
     delivered_at, latitude, longitude, audio_reference, battery_level, response_message, response_at";

/// Insert a new ping in the `sent` state.
pub async fn insert<'e, E>(executor: E, ping: &NewPing) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO pings (
            id, sender_id, receiver_id, ping_type, message, status, created_at,
            latitude, longitude, audio_reference, battery_level
        )
        VALUES (?, ?, ?, ?, ?, 'sent', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&ping.id)
    .bind(&ping.sender_id)
    .bind(&ping.receiver_id)
    .bind(&ping.ping_type)
    .bind(&ping.message)
    .bind(ping.created_at)
    .bind(ping.latitude)
    .bind(ping.longitude)
    .bind(&ping.audio_reference)
    .bind(ping.battery_level)
    .execute(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Ping", ping.id.clone()))?;

    Ok(())
}

/// Get a ping by ID.
pub async fn get<'e, E>(executor: E, id: &str) -> Result<Option<Ping>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!("SELECT {COLUMNS} FROM pings WHERE id = ?");
    let record = sqlx::query_as::<_, Ping>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(record)
}

/// Count pings of one class for an ordered pair within `[from, until)`.
pub async fn count_for_pair<'e, E>(
    executor: E,
    sender_id: &str,
    receiver_id: &str,
    ping_type: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM pings
        WHERE sender_id = ? AND receiver_id = ? AND ping_type = ?
          AND created_at >= ? AND created_at < ?
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .bind(ping_type)
    .bind(from)
    .bind(until)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Count pings of one class sent by a user to anyone within `[from, until)`.
pub async fn count_for_sender<'e, E>(
    executor: E,
    sender_id: &str,
    ping_type: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM pings
        WHERE sender_id = ? AND ping_type = ?
          AND created_at >= ? AND created_at < ?
        "#,
    )
    .bind(sender_id)
    .bind(ping_type)
    .bind(from)
    .bind(until)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Mark a ping delivered, stamping `delivered_at`. A repeat call re-stamps.
pub async fn mark_delivered<'e, E>(executor: E, id: &str, at: DateTime<Utc>) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE pings
        SET status = 'delivered', delivered_at = ?
        WHERE id = ?
        "#,
    )
    .bind(at)
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Ping",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Record the receiver's handshake reply if the slot is still empty.
///
/// Returns false when a reply was already recorded.
pub async fn record_response<'e, E>(
    executor: E,
    id: &str,
    message: &str,
    at: DateTime<Utc>,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE pings
        SET response_message = ?, response_at = ?
        WHERE id = ? AND response_at IS NULL
        "#,
    )
    .bind(message)
    .bind(at)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Most recent pings a user sent or received.
pub async fn history_for_user<'e, E>(executor: E, user_id: &str, limit: i64) -> Result<Vec<Ping>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!(
        "SELECT {COLUMNS} FROM pings \
         WHERE sender_id = ? OR receiver_id = ? \
         ORDER BY created_at DESC \
         LIMIT ?"
    );
    let rows = sqlx::query_as::<_, Ping>(&query)
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{user, Database, PingStatus};
    use chrono::{Duration, TimeZone};

    fn new_ping(id: &str, at: DateTime<Utc>) -> NewPing {
        NewPing {
            id: id.to_string(),
            sender_id: "alice".to_string(),
            receiver_id: "bob".to_string(),
            ping_type: "emergency".to_string(),
            message: "help".to_string(),
            created_at: at,
            latitude: Some(52.520008),
            longitude: Some(13.404954),
            audio_reference: None,
            battery_level: None,
        }
    }

    async fn seeded() -> Database {
        let db = Database::in_memory().await.unwrap();
        for id in ["alice", "bob"] {
            user::upsert_user(db.pool(), id, id).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_count_window_is_half_open() {
        let db = seeded().await;
        let midnight = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();

        insert(db.pool(), &new_ping("p1", midnight - Duration::seconds(1)))
            .await
            .unwrap();
        insert(db.pool(), &new_ping("p2", midnight)).await.unwrap();
        insert(db.pool(), &new_ping("p3", midnight + Duration::hours(23)))
            .await
            .unwrap();

        let count = count_for_pair(
            db.pool(),
            "alice",
            "bob",
            "emergency",
            midnight,
            midnight + Duration::days(1),
        )
        .await
        .unwrap();
        assert_eq!(count, 2);

        let reverse = count_for_pair(
            db.pool(),
            "bob",
            "alice",
            "emergency",
            midnight,
            midnight + Duration::days(1),
        )
        .await
        .unwrap();
        assert_eq!(reverse, 0);
    }

    #[tokio::test]
    async fn test_response_slot_is_single_use() {
        let db = seeded().await;
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        insert(db.pool(), &new_ping("p1", at)).await.unwrap();

        assert!(record_response(db.pool(), "p1", "on my way", at).await.unwrap());
        assert!(!record_response(db.pool(), "p1", "changed", at).await.unwrap());

        let ping = get(db.pool(), "p1").await.unwrap().unwrap();
        assert_eq!(ping.response_message.as_deref(), Some("on my way"));
        assert_eq!(ping.status, PingStatus::Sent);
        assert_eq!(ping.latitude, Some(52.520008));
    }
}
