//! Admin shell pages and administration APIs.
//!
//! The admin guard admits the shell as a whole; each page then checks its
//! own permission. Role and settings changes apply to sessions that sign in
//! afterwards.

use crate::{
    error::{ApiError, ApiResult},
    middleware::{require_permission, GuardLayer, PortalUser},
    response::ApiResponse,
    services::RoleDefinition,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use homestead_access::{
    visible_sections, AccessResult, AdminSection, Permission, SecuritySettings, UserIdentity,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Create the admin router, guarded by the admin portal guard.
pub fn router(state: &AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/navigation", get(navigation))
        .route("/admin/permissions", get(permission_catalog))
        .route("/admin/roles", get(list_roles))
        .route(
            "/admin/roles/:name",
            get(get_role).put(put_role).delete(delete_role),
        )
        .route(
            "/admin/settings/security",
            get(get_security).put(put_security),
        );

    for section in [
        AdminSection::Users,
        AdminSection::Properties,
        AdminSection::Agents,
        AdminSection::Inquiries,
        AdminSection::Reports,
        AdminSection::Settings,
    ] {
        router = router.route(
            section.path(),
            get(move |PortalUser(user): PortalUser| async move { section_page(section, user) }),
        );
    }

    router.route_layer(GuardLayer::admin(
        state.config.portals.clone(),
        state.sessions.clone(),
    ))
}

/// One admin menu entry.
#[derive(Debug, Serialize)]
pub struct NavItem {
    /// Section shown.
    pub section: AdminSection,
    /// Route of the section page.
    pub path: &'static str,
}

/// An admin section page.
#[derive(Debug, Serialize)]
pub struct SectionView {
    /// Section rendered.
    pub section: AdminSection,
    pub user: UserIdentity,
    /// Menu for the signed-in user.
    pub navigation: Vec<NavItem>,
}

/// Catalog entry listed to role managers.
#[derive(Debug, Serialize)]
pub struct PermissionInfo {
    /// Permission key.
    pub key: Permission,
    /// Human-readable description.
    pub description: &'static str,
}

/// Body of a role update.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// Permission keys granted to the role.
    pub permissions: Vec<String>,
}

fn navigation_for(user: &UserIdentity) -> Vec<NavItem> {
    visible_sections(Some(user))
        .into_iter()
        .map(|section| NavItem {
            section,
            path: section.path(),
        })
        .collect()
}

fn section_page(
    section: AdminSection,
    user: UserIdentity,
) -> ApiResult<Json<ApiResponse<SectionView>>> {
    if let Some(permission) = section.required_permission() {
        require_permission(&user, permission)?;
    }
    let navigation = navigation_for(&user);
    Ok(Json(ApiResponse::success(SectionView {
        section,
        user,
        navigation,
    })))
}

async fn dashboard(PortalUser(user): PortalUser) -> ApiResult<Json<ApiResponse<SectionView>>> {
    section_page(AdminSection::Dashboard, user)
}

async fn navigation(PortalUser(user): PortalUser) -> Json<ApiResponse<Vec<NavItem>>> {
    Json(ApiResponse::success(navigation_for(&user)))
}

async fn permission_catalog(
    PortalUser(user): PortalUser,
) -> ApiResult<Json<ApiResponse<Vec<PermissionInfo>>>> {
    require_permission(&user, Permission::RolesManage)?;
    let catalog = Permission::ALL
        .iter()
        .map(|&key| PermissionInfo {
            key,
            description: key.describe(),
        })
        .collect();
    Ok(Json(ApiResponse::success(catalog)))
}

async fn list_roles(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
) -> ApiResult<Json<ApiResponse<Vec<RoleDefinition>>>> {
    require_permission(&user, Permission::RolesManage)?;
    Ok(Json(ApiResponse::success(state.roles.list())))
}

async fn get_role(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<RoleDefinition>>> {
    require_permission(&user, Permission::RolesManage)?;
    state
        .roles
        .get(&name)
        .map(|role| Json(ApiResponse::success(role)))
        .ok_or_else(|| ApiError::NotFound(format!("Role {}", name)))
}

async fn put_role(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(name): Path<String>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<Json<ApiResponse<RoleDefinition>>> {
    require_permission(&user, Permission::RolesManage)?;
    let permissions = request
        .permissions
        .iter()
        .map(|key| key.parse::<Permission>())
        .collect::<AccessResult<BTreeSet<_>>>()?;

    let role = state.roles.upsert(&name, permissions)?;
    info!(user_id = %user.id, role = %role.name, "Role updated");
    Ok(Json(ApiResponse::success(role)))
}

async fn delete_role(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    require_permission(&user, Permission::RolesManage)?;
    if !state.roles.remove(&name) {
        return Err(ApiError::NotFound(format!("Role {}", name)));
    }
    info!(user_id = %user.id, role = %name, "Role removed");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_security(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
) -> ApiResult<Json<ApiResponse<SecuritySettings>>> {
    require_permission(&user, Permission::SettingsView)?;
    Ok(Json(ApiResponse::success(state.settings.security())))
}

async fn put_security(
    State(state): State<AppState>,
    PortalUser(user): PortalUser,
    Json(settings): Json<SecuritySettings>,
) -> ApiResult<Json<ApiResponse<SecuritySettings>>> {
    require_permission(&user, Permission::SettingsManage)?;
    let settings = state.settings.update(settings)?;
    info!(
        user_id = %user.id,
        session_timeout = settings.session_timeout,
        "Security settings changed"
    );
    Ok(Json(ApiResponse::success(settings)))
}
