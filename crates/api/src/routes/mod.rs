//! Route handlers for the HTTP service.

pub mod checkin;
pub mod friends;
pub mod health;
pub mod limits;
pub mod pings;
pub mod users;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Profile
        .route("/me", get(users::me).delete(users::delete_account))
        .route("/me/status", patch(users::update_status))
        .route("/me/nickname", patch(users::update_nickname))
        .route("/me/fcm-token", put(users::set_push_token))
        .route("/me/logout", post(users::logout))
        .route("/users/search", get(users::search))
        // Friends
        .route("/friends", get(friends::list_friends))
        .route(
            "/friends/requests",
            get(friends::list_requests).post(friends::create_request),
        )
        .route("/friends/requests/:id", patch(friends::respond))
        .route("/friends/:friend_id", delete(friends::unfriend))
        .route(
            "/friends/:friend_id/block",
            post(friends::block).delete(friends::unblock),
        )
        .route("/friends/:friend_id/vip", patch(friends::set_vip))
        .route("/friends/:friend_id/ringtone", patch(friends::set_ringtone))
        // Pings
        .route("/pings", post(pings::send))
        .route("/pings/history", get(pings::history))
        .route("/pings/:id", get(pings::get_ping))
        .route("/pings/:id/delivered", post(pings::mark_delivered))
        .route("/pings/:id/handshake", post(pings::handshake))
        // Limits
        .route("/limits", get(limits::daily_usage))
        .route("/limits/:friend_id", get(limits::pair_quota))
        // Check-in
        .route("/checkin", get(checkin::active).post(checkin::start))
        .route("/checkin/safe", post(checkin::mark_safe))
}
