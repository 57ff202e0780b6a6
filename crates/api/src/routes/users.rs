//! Profile and directory routes.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::User;
use serde::Deserialize;

use crate::auth::current_user;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct NicknameRequest {
    #[serde(default)]
    pub nickname: String,
}

#[derive(Deserialize)]
pub struct PushTokenRequest {
    pub fcm_token: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.profiles().get(&user_id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<StatusRequest>,
) -> Result<Json<User>> {
    let user_id = current_user(&state, &headers).await?;
    let user = state.engine.profiles().update_status(&user_id, &req.status).await?;
    Ok(Json(user))
}

pub async fn update_nickname(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<NicknameRequest>,
) -> Result<Json<User>> {
    let user_id = current_user(&state, &headers).await?;
    let user = state
        .engine
        .profiles()
        .update_nickname(&user_id, &req.nickname)
        .await?;
    Ok(Json(user))
}

pub async fn set_push_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<PushTokenRequest>,
) -> Result<Json<User>> {
    let user_id = current_user(&state, &headers).await?;
    let user = state
        .engine
        .profiles()
        .set_push_token(&user_id, &req.fcm_token)
        .await?;
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let user_id = current_user(&state, &headers).await?;
    state.engine.profiles().logout(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let user_id = current_user(&state, &headers).await?;
    state.engine.profiles().delete_account(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<User>>> {
    let user_id = current_user(&state, &headers).await?;
    let users = state.engine.profiles().search(&user_id, &params.q).await?;
    Ok(Json(users))
}
