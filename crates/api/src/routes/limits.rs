//! Emergency quota routes.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use safety_core::{DailyUsage, PairQuota};

use crate::auth::current_user;
use crate::error::Result;
use crate::state::AppState;

/// Emergency pings sent today across all friends.
pub async fn daily_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DailyUsage>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.pings().daily_usage(&user_id).await?))
}

/// Remaining emergency pings to one friend today.
pub async fn pair_quota(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
) -> Result<Json<PairQuota>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.pings().pair_quota(&user_id, &friend_id).await?))
}
