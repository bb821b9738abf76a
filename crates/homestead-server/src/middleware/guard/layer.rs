//! Portal guard layer.
//!
//! Wraps a portal's routes with a [`RouteGuard`]. Admitted requests reach the
//! handler with a [`PortalUser`] extension; everything else is answered here.

use super::audit::GuardAuditEvent;
use crate::error::ApiError;
use crate::middleware::auth::{CurrentSession, PortalUser};
use crate::sessions::SessionRegistry;
use axum::{
    body::Body,
    extract::OriginalUri,
    http::{Request, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use homestead_access::{GuardKind, GuardOutcome, PortalRoutes, RedirectReason, RouteGuard, SignOutReason};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

/// Guard layer configuration.
#[derive(Clone)]
pub struct GuardLayer {
    guard: RouteGuard,
    registry: SessionRegistry,
}

impl GuardLayer {
    /// Guard of `kind`, redirecting to the login paths in `routes`.
    pub fn new(kind: GuardKind, routes: PortalRoutes, registry: SessionRegistry) -> Self {
        Self {
            guard: RouteGuard::new(kind, routes),
            registry,
        }
    }

    /// Admin portal guard.
    pub fn admin(routes: PortalRoutes, registry: SessionRegistry) -> Self {
        Self::new(GuardKind::Admin, routes, registry)
    }

    /// Customer portal guard.
    pub fn customer(routes: PortalRoutes, registry: SessionRegistry) -> Self {
        Self::new(GuardKind::Customer, routes, registry)
    }

    /// Vendor (agent) portal guard.
    pub fn vendor(routes: PortalRoutes, registry: SessionRegistry) -> Self {
        Self::new(GuardKind::Vendor, routes, registry)
    }

    /// Sub-admin area guard.
    pub fn subadmin(routes: PortalRoutes, registry: SessionRegistry) -> Self {
        Self::new(GuardKind::SubAdmin, routes, registry)
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            guard: self.guard.clone(),
            registry: self.registry.clone(),
        }
    }
}

/// Guard middleware service.
#[derive(Clone)]
pub struct GuardMiddleware<S> {
    inner: S,
    guard: RouteGuard,
    registry: SessionRegistry,
}

impl<S> Service<Request<Body>> for GuardMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let guard = self.guard.clone();
        let registry = self.registry.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(CurrentSession(entry)) = req.extensions().get::<CurrentSession>().cloned()
            else {
                warn!(guard = ?guard.kind(), "Guarded route without session layer");
                return Ok(ApiError::Unauthorized.into_response());
            };

            let location = request_location(&req);
            let user_id = entry.context().user().map(|u| u.id);
            let outcome = guard.check(entry.context(), &location);
            GuardAuditEvent::new(entry.id(), user_id.as_deref(), guard.kind(), &location, &outcome)
                .log();

            match outcome {
                GuardOutcome::Pending => Ok((
                    StatusCode::ACCEPTED,
                    Json(json!({ "status": "loading" })),
                )
                    .into_response()),
                GuardOutcome::Redirect(redirect) => {
                    if redirect.reason == RedirectReason::WrongPortal {
                        // Context already cleared; stop the monitor and revoke.
                        registry.sign_out(&entry, SignOutReason::PortalMismatch).await;
                    }
                    Ok(Redirect::to(&redirect.location()).into_response())
                }
                GuardOutcome::Render(user) => {
                    req.extensions_mut().insert(PortalUser(user));
                    inner.call(req).await
                }
            }
        })
    }
}

/// Path and query as the client sent them, before any nesting strips a prefix.
fn request_location(req: &Request<Body>) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri());
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_location_keeps_query() {
        let req = Request::builder()
            .uri("/admin/users?page=2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_location(&req), "/admin/users?page=2");
    }

    #[test]
    fn test_request_location_prefers_original_uri() {
        let mut req = Request::builder().uri("/users").body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(OriginalUri("/admin/users".parse().unwrap()));
        assert_eq!(request_location(&req), "/admin/users");
    }
}
