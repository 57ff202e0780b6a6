//! Profile settings and user search.

use database::validation::{validate_optional, validate_required, MAX_PROFILE_FIELD_LENGTH};
use database::{user, Database, User};
use tracing::info;

use crate::error::Result;

/// Longest push token accepted.
const MAX_PUSH_TOKEN_LENGTH: usize = 255;

/// Reads and updates the caller's own profile.
#[derive(Debug, Clone)]
pub struct Profiles {
    db: Database,
    search_limit: i64,
}

impl Profiles {
    pub fn new(db: Database, search_limit: i64) -> Self {
        Self { db, search_limit }
    }

    /// Register a user on first sight.
    ///
    /// A given `username` refreshes the stored one. Without it a new user
    /// is named after their id and a known user keeps their name.
    pub async fn ensure(&self, user_id: &str, username: Option<&str>) -> Result<()> {
        match username {
            Some(username) => {
                let username = validate_required("username", username, MAX_PROFILE_FIELD_LENGTH)?;
                user::upsert_user(self.db.pool(), user_id, &username).await?;
            }
            None => user::insert_user_if_missing(self.db.pool(), user_id, user_id).await?,
        }
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<User> {
        Ok(user::get_user(self.db.pool(), user_id).await?)
    }

    /// Set availability status (e.g., "available", "driving", "busy").
    pub async fn update_status(&self, user_id: &str, status: &str) -> Result<User> {
        let status = validate_required("status", status, MAX_PROFILE_FIELD_LENGTH)?;
        user::update_status(self.db.pool(), user_id, &status).await?;
        self.get(user_id).await
    }

    pub async fn update_nickname(&self, user_id: &str, nickname: &str) -> Result<User> {
        let nickname = validate_optional("nickname", nickname, MAX_PROFILE_FIELD_LENGTH)?;
        user::update_nickname(self.db.pool(), user_id, &nickname).await?;
        self.get(user_id).await
    }

    /// Register the device token push notifications go to.
    pub async fn set_push_token(&self, user_id: &str, token: &str) -> Result<User> {
        let token = validate_required("fcm_token", token, MAX_PUSH_TOKEN_LENGTH)?;
        user::set_fcm_token(self.db.pool(), user_id, Some(&token)).await?;
        self.get(user_id).await
    }

    /// Drop the push token so a signed-out device stops receiving pings.
    pub async fn logout(&self, user_id: &str) -> Result<()> {
        user::set_fcm_token(self.db.pool(), user_id, None).await?;
        info!(user_id = %user_id, "Logged out");
        Ok(())
    }

    /// Delete the account with its relationships, pings and sessions.
    pub async fn delete_account(&self, user_id: &str) -> Result<()> {
        user::delete_user(self.db.pool(), user_id).await?;
        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    /// Users whose username or nickname contains `query`, excluding the caller.
    pub async fn search(&self, user_id: &str, query: &str) -> Result<Vec<User>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(user::search_users(self.db.pool(), query, user_id, self.search_limit).await?)
    }
}
