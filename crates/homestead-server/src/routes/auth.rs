//! Login surfaces and logout.

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentSession,
    response::ApiResponse,
    sessions::SessionEntry,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use homestead_access::{
    mismatch_message, AuthService, Credentials, GuardKind, Portal, Role, SignOutReason,
    UserIdentity,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Create the login/logout router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(customer_surface).post(customer_login))
        .route("/vendor/login", get(vendor_surface).post(vendor_login))
        .route("/admin/login", get(admin_surface).post(admin_login))
        .route("/logout", post(logout))
}

/// Query parameters a guard redirect attaches to a login surface.
#[derive(Debug, Default, Deserialize)]
pub struct SurfaceQuery {
    /// Page the visitor was sent away from.
    pub from: Option<String>,
    /// Notice to show above the form.
    pub message: Option<String>,
}

/// What a login surface shows.
#[derive(Debug, Serialize)]
pub struct LoginSurface {
    /// Portal this surface signs into.
    pub portal: Portal,
    /// Path the form posts to.
    pub login_path: String,
    /// Page to return to after login.
    pub from: Option<String>,
    /// Notice to show above the form.
    pub message: Option<String>,
}

/// Login form body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    /// Account email.
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    /// Plain-text password.
    pub password: String,
    /// Page to return to after login.
    #[serde(default)]
    pub from: Option<String>,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token for API clients.
    pub token: String,
    /// Signed-in identity.
    pub user: UserIdentity,
    /// Where the client should go next.
    pub redirect_to: String,
}

async fn customer_surface(
    state: State<AppState>,
    session: CurrentSession,
    query: Query<SurfaceQuery>,
) -> Json<ApiResponse<LoginSurface>> {
    surface(state, session, query, Portal::Customer)
}

async fn vendor_surface(
    state: State<AppState>,
    session: CurrentSession,
    query: Query<SurfaceQuery>,
) -> Json<ApiResponse<LoginSurface>> {
    surface(state, session, query, Portal::Vendor)
}

async fn admin_surface(
    state: State<AppState>,
    session: CurrentSession,
    query: Query<SurfaceQuery>,
) -> Json<ApiResponse<LoginSurface>> {
    surface(state, session, query, Portal::Admin)
}

fn surface(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<SurfaceQuery>,
    portal: Portal,
) -> Json<ApiResponse<LoginSurface>> {
    // A direct visit after an inactivity sign-out still shows the notice.
    let message = query
        .message
        .or_else(|| session.status().notice.map(String::from));

    Json(ApiResponse::success(LoginSurface {
        portal,
        login_path: state.config.portals.login_path(portal).to_string(),
        from: query.from,
        message,
    }))
}

async fn customer_login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    sign_in(&state, &session, Portal::Customer, request).await
}

async fn vendor_login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    sign_in(&state, &session, Portal::Vendor, request).await
}

async fn admin_login(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    sign_in(&state, &session, Portal::Admin, request).await
}

async fn sign_in(
    state: &AppState,
    session: &Arc<SessionEntry>,
    portal: Portal,
    request: LoginRequest,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    request.validate()?;

    let credentials = Credentials {
        email: request.email,
        password: request.password,
    };
    let grant = state.accounts.login(&credentials).await?;

    if !admitted(portal, &grant.user) {
        warn!(
            user_id = %grant.user.id,
            role = %grant.user.role,
            portal = %portal,
            "Login refused on foreign portal"
        );
        state.accounts.logout(&grant.token).await?;
        return Err(ApiError::WrongPortal(mismatch_message(
            &grant.user.role,
            portal,
        )));
    }

    let redirect_to = request
        .from
        .filter(|from| is_local_path(from))
        .unwrap_or_else(|| landing_path(portal, &grant.user.role).to_string());
    let response = LoginResponse {
        token: grant.token.clone(),
        user: grant.user.clone(),
        redirect_to,
    };

    state.sessions.sign_in(session, grant).await;
    info!(
        session_id = %session.id(),
        user_id = %response.user.id,
        portal = %portal,
        "Signed in"
    );

    Ok(Json(ApiResponse::success(response)))
}

async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> StatusCode {
    if state.sessions.sign_out(&session, SignOutReason::Logout).await {
        info!(session_id = %session.id(), "Signed out");
    }
    StatusCode::NO_CONTENT
}

/// Whether any guard of `portal` would let `user` in.
fn admitted(portal: Portal, user: &UserIdentity) -> bool {
    match portal {
        Portal::Customer => GuardKind::Customer.admits(user),
        Portal::Vendor => GuardKind::Vendor.admits(user),
        Portal::Admin => GuardKind::Admin.admits(user) || GuardKind::SubAdmin.admits(user),
    }
}

fn landing_path(portal: Portal, role: &Role) -> &'static str {
    match (portal, role) {
        (Portal::Customer, _) => "/account",
        (Portal::Vendor, _) => "/vendor/dashboard",
        (Portal::Admin, Role::SubAdmin) => "/subadmin",
        (Portal::Admin, _) => "/admin",
    }
}

/// Same-origin path. `//host` and `/\host` both resolve to another origin,
/// and control characters are stripped by URL parsers, so all are refused.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_access::Permission;
    use proptest::prelude::*;

    #[test]
    fn test_admitted_per_portal() {
        let agent = UserIdentity::new("a", "a@example.com", Role::Agent);
        assert!(admitted(Portal::Vendor, &agent));
        assert!(!admitted(Portal::Admin, &agent));
        assert!(!admitted(Portal::Customer, &agent));

        let sub = UserIdentity::new("s", "s@example.com", Role::SubAdmin);
        assert!(admitted(Portal::Admin, &sub));

        let bare = UserIdentity::new("m", "m@example.com", Role::parse("moderator"));
        assert!(!admitted(Portal::Admin, &bare));
        let granted = bare.with_permissions([Permission::ReportsView]);
        assert!(admitted(Portal::Admin, &granted));

        let root = UserIdentity::new("r", "r@example.com", Role::SuperAdmin);
        assert!(admitted(Portal::Customer, &root));
    }

    #[test]
    fn test_landing_paths() {
        assert_eq!(landing_path(Portal::Admin, &Role::SubAdmin), "/subadmin");
        assert_eq!(landing_path(Portal::Admin, &Role::Admin), "/admin");
        assert_eq!(landing_path(Portal::Vendor, &Role::Agent), "/vendor/dashboard");
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/admin/users?page=2"));
        assert!(!is_local_path("//evil.example.com"));
        assert!(!is_local_path("https://evil.example.com"));
        assert!(!is_local_path("/\\evil.example.com"));
        assert!(!is_local_path("/\t/evil.example.com"));
        assert!(!is_local_path("/account\n"));
        assert!(!is_local_path(""));
    }

    fn resolve(path: &str) -> url::Url {
        let base = url::Url::parse("https://homestead.example/login").unwrap();
        base.join(path).unwrap()
    }

    proptest! {
        #[test]
        fn accepted_redirects_stay_on_origin(path in "[/\\\\a-z.:@?#%\t ]{0,16}") {
            if is_local_path(&path) {
                let resolved = resolve(&path);
                prop_assert_eq!(resolved.host_str(), Some("homestead.example"));
            }
        }

        #[test]
        fn accepted_redirects_stay_on_origin_any_text(path in "/\\PC*") {
            if is_local_path(&path) {
                let resolved = resolve(&path);
                prop_assert_eq!(resolved.host_str(), Some("homestead.example"));
            }
        }
    }
}
