//! Authenticated-user resolution.
//!
//! Identity is established by the fronting proxy, which forwards it in
//! `X-User-Id` (and optionally `X-Username`). First sight registers the user;
//! a later request without `X-Username` leaves the stored name alone.

use axum::http::HeaderMap;

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";

/// Resolve the caller's user id, registering the user if needed.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<String> {
    let Some(user_id) = header_str(headers, USER_ID_HEADER) else {
        return Err(ApiError::Unauthorized);
    };

    let username = header_str(headers, USERNAME_HEADER);
    state.engine.profiles().ensure(user_id, username).await?;

    Ok(user_id.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
