//! Ping routes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use database::Ping;
use safety_core::SendPing;
use serde::Deserialize;

use crate::auth::current_user;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HandshakeRequest {
    pub response_message: String,
}

pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<SendPing>,
) -> Result<(StatusCode, Json<Ping>)> {
    let user_id = current_user(&state, &headers).await?;
    let ping = state.engine.pings().send(&user_id, req).await?;
    Ok((StatusCode::CREATED, Json(ping)))
}

pub async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Ping>>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.pings().history(&user_id).await?))
}

pub async fn get_ping(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Ping>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.pings().get(&id, &user_id).await?))
}

pub async fn mark_delivered(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Ping>> {
    let user_id = current_user(&state, &headers).await?;
    Ok(Json(state.engine.pings().mark_delivered(&id, &user_id).await?))
}

pub async fn handshake(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<HandshakeRequest>,
) -> Result<Json<Ping>> {
    let user_id = current_user(&state, &headers).await?;
    let ping = state
        .engine
        .pings()
        .handshake(&id, &user_id, &req.response_message)
        .await?;
    Ok(Json(ping))
}
