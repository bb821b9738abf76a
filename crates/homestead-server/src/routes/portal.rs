//! Customer, vendor and sub-admin portal pages.

use crate::{
    error::ApiResult,
    middleware::{require_permission, GuardLayer, PortalUser},
    response::ApiResponse,
    state::AppState,
};
use axum::{routing::get, Json, Router};
use homestead_access::{Permission, Portal, UserIdentity};
use serde::Serialize;

/// A rendered portal page.
#[derive(Debug, Serialize)]
pub struct PageView {
    /// Portal the page belongs to.
    pub portal: Portal,
    /// Page name.
    pub page: &'static str,
    /// Signed-in user.
    pub user: UserIdentity,
}

impl PageView {
    fn new(portal: Portal, page: &'static str, user: UserIdentity) -> Json<ApiResponse<Self>> {
        Json(ApiResponse::success(Self { portal, page, user }))
    }
}

/// Customer account pages.
pub fn customer_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/account", get(account_overview))
        .route("/account/favorites", get(account_favorites))
        .route("/account/inquiries", get(account_inquiries))
        .route_layer(GuardLayer::customer(
            state.config.portals.clone(),
            state.sessions.clone(),
        ))
}

/// Agent dashboard pages.
pub fn vendor_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/vendor/dashboard", get(vendor_dashboard))
        .route("/vendor/listings", get(vendor_listings))
        .route_layer(GuardLayer::vendor(
            state.config.portals.clone(),
            state.sessions.clone(),
        ))
}

/// Sub-admin pages.
pub fn subadmin_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/subadmin", get(subadmin_dashboard))
        .route("/subadmin/properties", get(subadmin_properties))
        .route("/subadmin/inquiries", get(subadmin_inquiries))
        .route_layer(GuardLayer::subadmin(
            state.config.portals.clone(),
            state.sessions.clone(),
        ))
}

async fn account_overview(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Customer, "overview", user)
}

async fn account_favorites(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Customer, "favorites", user)
}

async fn account_inquiries(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Customer, "inquiries", user)
}

async fn vendor_dashboard(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Vendor, "dashboard", user)
}

async fn vendor_listings(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Vendor, "listings", user)
}

async fn subadmin_dashboard(PortalUser(user): PortalUser) -> Json<ApiResponse<PageView>> {
    PageView::new(Portal::Admin, "subadmin_dashboard", user)
}

async fn subadmin_properties(
    PortalUser(user): PortalUser,
) -> ApiResult<Json<ApiResponse<PageView>>> {
    require_permission(&user, Permission::PropertiesView)?;
    Ok(PageView::new(Portal::Admin, "subadmin_properties", user))
}

async fn subadmin_inquiries(
    PortalUser(user): PortalUser,
) -> ApiResult<Json<ApiResponse<PageView>>> {
    require_permission(&user, Permission::InquiriesView)?;
    Ok(PageView::new(Portal::Admin, "subadmin_inquiries", user))
}
