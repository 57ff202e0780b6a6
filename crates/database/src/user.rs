//! User directory operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Insert a user on first sight, or refresh the username of a known one.
pub async fn upsert_user(pool: &SqlitePool, id: &str, username: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username)
        VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET
            username = excluded.username
        "#,
    )
    .bind(id)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a user on first sight, leaving a known user untouched.
pub async fn insert_user_if_missing(pool: &SqlitePool, id: &str, username: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username)
        VALUES (?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, nickname, status, fcm_token
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Check whether a user exists.
pub async fn user_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let row = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1 FROM users WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Update a user's availability status.
pub async fn update_status(pool: &SqlitePool, id: &str, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Update a user's nickname.
pub async fn update_nickname(pool: &SqlitePool, id: &str, nickname: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET nickname = ?
        WHERE id = ?
        "#,
    )
    .bind(nickname)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Set or clear the push notification token.
pub async fn set_fcm_token(pool: &SqlitePool, id: &str, token: Option<&str>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET fcm_token = ?
        WHERE id = ?
        "#,
    )
    .bind(token)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Delete a user by ID.
///
/// Relationships, pings and check-in sessions go with it via `ON DELETE CASCADE`.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    ensure_updated(result.rows_affected(), id)
}

/// Substring search over username and nickname, case-insensitive for ASCII.
///
/// SQLite's `lower()` and `LIKE` only fold ASCII letters, so the query is
/// folded the same way and other characters must match exactly.
pub async fn search_users(
    pool: &SqlitePool,
    query: &str,
    exclude_id: &str,
    limit: i64,
) -> Result<Vec<User>> {
    let pattern = format!("%{}%", escape_like(&query.to_ascii_lowercase()));
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, nickname, status, fcm_token
        FROM users
        WHERE (lower(username) LIKE ? ESCAPE '\' OR lower(nickname) LIKE ? ESCAPE '\')
          AND id <> ?
        ORDER BY username
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn ensure_updated(rows_affected: u64, id: &str) -> Result<()> {
    if rows_affected == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }
    Ok(())
}
