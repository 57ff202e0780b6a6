//! Friendship routes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::Relationship;
use safety_core::{CoreError, FriendEntry, RespondAction};
use serde::Deserialize;

use crate::auth::current_user;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::state::AppState;

/// Request to befriend another user.
#[derive(Deserialize)]
pub struct FriendRequest {
    pub to_user_id: String,
}

/// Answer to a pending request: `accept` or `decline`.
#[derive(Deserialize)]
pub struct RespondRequest {
    pub action: String,
}

#[derive(Deserialize)]
pub struct VipRequest {
    pub is_vip: bool,
}

#[derive(Deserialize)]
pub struct RingtoneRequest {
    pub ringtone: String,
}

pub async fn list_friends(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FriendEntry>>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.relationships().list_friends(&user_id).await?))
}

/// Pending requests the caller sent or received.
pub async fn list_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Relationship>>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.relationships().list_pending(&user_id).await?))
}

pub async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<FriendRequest>,
) -> Result<(StatusCode, Json<Relationship>)> {
    let user_id = current_user(&state, &headers).await?;
    let relationship = state
        .engine
        .relationships()
        .create_request(&user_id, req.to_user_id.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(relationship)))
}

pub async fn respond(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RespondRequest>,
) -> Result<Json<Relationship>> {
    let user_id = current_user(&state, &headers).await?;
    let action: RespondAction = req.action.parse().map_err(CoreError::from)?;
    let relationship = state
        .engine
        .relationships()
        .respond(&id, &user_id, action)
        .await?;
    Ok(Json(relationship))
}

pub async fn unfriend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
) -> Result<StatusCode> {
    let user_id = current_user(&state, &headers).await?;
    state.engine.relationships().unfriend(&user_id, &friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn block(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
) -> Result<Json<Relationship>> {
    let user_id = current_user(&state, &headers).await?;
    let relationship = state.engine.relationships().block(&user_id, &friend_id).await?;
    Ok(Json(relationship))
}

pub async fn unblock(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
) -> Result<StatusCode> {
    let user_id = current_user(&state, &headers).await?;
    state.engine.relationships().unblock(&user_id, &friend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_vip(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
    JsonBody(req): JsonBody<VipRequest>,
) -> Result<Json<Relationship>> {
    let user_id = current_user(&state, &headers).await?;
    let relationship = state
        .engine
        .relationships()
        .set_vip(&user_id, &friend_id, req.is_vip)
        .await?;
    Ok(Json(relationship))
}

pub async fn set_ringtone(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(friend_id): Path<String>,
    JsonBody(req): JsonBody<RingtoneRequest>,
) -> Result<Json<Relationship>> {
    let user_id = current_user(&state, &headers).await?;
    let relationship = state
        .engine
        .relationships()
        .set_ringtone(&user_id, &friend_id, &req.ringtone)
        .await?;
    Ok(Json(relationship))
}
