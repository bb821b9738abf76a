//! Session resolution middleware.
//!
//! Attaches the caller's [`SessionEntry`] to every request. A known session
//! cookie wins; otherwise a bearer token or `access_token` cookie resolves to
//! the session holding it, and failing both the request runs on a fresh
//! anonymous entry.

use super::extractor::CurrentSession;
use crate::sessions::{SessionEntry, SessionRegistry};
use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Session layer configuration.
#[derive(Clone)]
pub struct SessionLayer {
    registry: SessionRegistry,
    cookie_name: Arc<str>,
}

impl SessionLayer {
    /// Resolve sessions from `registry`, keyed by the `cookie_name` cookie.
    pub fn new(registry: SessionRegistry, cookie_name: &str) -> Self {
        Self {
            registry,
            cookie_name: Arc::from(cookie_name),
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            registry: self.registry.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

/// Session middleware service.
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    registry: SessionRegistry,
    cookie_name: Arc<str>,
}

impl<S> Service<Request<Body>> for SessionMiddleware<S>
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
        let registry = self.registry.clone();
        let cookie_name = self.cookie_name.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let session_id = cookie_value(&req, &cookie_name);
            let token = extract_token(&req);
            let (entry, known) = resolve_session(&registry, session_id, token).await;
            req.extensions_mut().insert(CurrentSession(entry.clone()));

            let mut response = inner.call(req).await?;

            if !known && registry.contains(&entry) {
                match session_cookie(&cookie_name, entry.id()) {
                    Some(value) => {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    None => warn!(session_id = %entry.id(), "Session cookie not representable"),
                }
            }
            Ok(response)
        })
    }
}

/// Find the caller's session. The flag says whether the client already
/// holds a cookie for it.
async fn resolve_session(
    registry: &SessionRegistry,
    session_id: Option<String>,
    token: Option<String>,
) -> (Arc<SessionEntry>, bool) {
    if let Some(entry) = session_id.and_then(|id| registry.get(&id)) {
        // Expired or portal-mismatched sessions still hold their token.
        registry.release_token(&entry).await;
        return (entry, true);
    }

    match token {
        Some(token) => {
            debug!("Restoring session from access token");
            (registry.restore(&token).await, false)
        }
        None => (registry.open(), false),
    }
}

fn session_cookie(name: &str, id: &str) -> Option<HeaderValue> {
    let cookie = Cookie::build((name.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

fn cookie_value(req: &Request<Body>, name: &str) -> Option<String> {
    let cookie_str = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookie_str.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    // Try Authorization header first
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        if let Some(token) = auth_header
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix("Bearer "))
        {
            return Some(token.to_string());
        }
    }

    // Try cookie as fallback
    cookie_value(req, "access_token")
}
