//! Check-in routes.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::CheckInSession;
use serde::{Deserialize, Serialize};

use crate::auth::current_user;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartRequest {
    /// Minutes until the alert fires; the engine default when absent.
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub struct SafeResponse {
    pub cleared: u64,
}

pub async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<StartRequest>,
) -> Result<(StatusCode, Json<CheckInSession>)> {
    let user_id = current_user(&state, &headers).await?;
    let session = state
        .engine
        .checkins()
        .start(&user_id, req.duration_minutes, &req.message)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn mark_safe(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SafeResponse>> {
    let user_id = current_user(&state, &headers).await?;
    let cleared = state.engine.checkins().mark_safe(&user_id).await?;
    Ok(Json(SafeResponse { cleared }))
}

/// The caller's running session, or `null`.
pub async fn active(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<CheckInSession>>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.checkins().active(&user_id).await?))
}
