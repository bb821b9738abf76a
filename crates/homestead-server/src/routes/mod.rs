//! Route configuration for the Homestead gateway.

mod admin;
mod auth;
mod internal;
mod portal;
mod session;

pub use admin::{NavItem, SectionView};
pub use auth::{LoginRequest, LoginResponse, LoginSurface};
pub use portal::PageView;

use crate::{middleware::SessionLayer, state::AppState};
use axum::{http::StatusCode, response::IntoResponse, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Common middleware stack applied to all routes
    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )));

    // Everything a browser tab touches runs with its session attached
    let portals = Router::new()
        .merge(auth::router())
        .merge(session::router())
        .merge(portal::customer_router(&state))
        .merge(portal::vendor_router(&state))
        .merge(portal::subadmin_router(&state))
        .merge(admin::router(&state))
        .layer(SessionLayer::new(
            state.sessions.clone(),
            &state.config.auth.session_cookie,
        ));

    Router::new()
        .merge(portals)
        .nest("/internal", internal::router())
        .fallback(fallback_handler)
        .layer(common_middleware)
        .with_state(state)
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({
            "success": false,
            "error": {
                "code": "not_found",
                "message": "The requested resource was not found"
            }
        })),
    )
}
