//! Session status and activity reporting.
//!
//! Clients forward user interaction here so the inactivity monitor sees it,
//! and poll the status to show the expiry warning.

use crate::{
    middleware::CurrentSession, response::ApiResponse, sessions::SessionStatus, state::AppState,
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use homestead_access::ActivityKind;
use serde::Deserialize;

/// Session status and activity routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session/status", get(status))
        .route("/session/activity", post(activity))
        .route("/session/keep-alive", post(keep_alive))
}

/// Activity event reported by the client.
#[derive(Debug, Deserialize)]
pub struct ActivityRequest {
    /// Interaction kind.
    pub kind: ActivityKind,
}

async fn status(CurrentSession(session): CurrentSession) -> Json<ApiResponse<SessionStatus>> {
    Json(ApiResponse::success(session.status()))
}

async fn activity(
    CurrentSession(session): CurrentSession,
    Json(request): Json<ActivityRequest>,
) -> Json<ApiResponse<SessionStatus>> {
    session.record_activity(request.kind);
    Json(ApiResponse::success(session.status()))
}

/// "Stay logged in" from the warning prompt.
async fn keep_alive(CurrentSession(session): CurrentSession) -> Json<ApiResponse<SessionStatus>> {
    session.stay_logged_in();
    Json(ApiResponse::success(session.status()))
}
