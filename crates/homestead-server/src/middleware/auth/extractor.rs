//! Session extractors for handlers.

use crate::error::ApiError;
use crate::sessions::SessionEntry;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use homestead_access::{has_permission, Permission, UserIdentity};
use std::sync::Arc;
use tracing::warn;

/// The caller's session, attached by the session layer.
#[derive(Clone)]
pub struct CurrentSession(pub Arc<SessionEntry>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| {
                warn!("Session extractor used without session layer");
                ApiError::Unauthorized
            })
    }
}

/// User admitted by a portal guard.
#[derive(Debug, Clone)]
pub struct PortalUser(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for PortalUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PortalUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Reject unless `user` holds `permission`.
pub fn require_permission(user: &UserIdentity, permission: Permission) -> Result<(), ApiError> {
    if has_permission(Some(user), permission) {
        Ok(())
    } else {
        warn!(user_id = %user.id, permission = %permission, "Permission denied");
        Err(ApiError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use homestead_access::Role;

    #[tokio::test]
    async fn test_portal_user_extractor() {
        let user = UserIdentity::new("u-1", "agent@example.com", Role::Agent);
        let (mut parts, _) = Request::new(()).into_parts();
        parts.extensions.insert(PortalUser(user.clone()));

        let PortalUser(extracted) = PortalUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_portal_user_missing() {
        let (mut parts, _) = Request::new(()).into_parts();
        let result = PortalUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));

        let result = CurrentSession::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_require_permission() {
        let moderator = UserIdentity::new("u-2", "m@example.com", Role::parse("moderator"))
            .with_permissions([Permission::PropertiesView]);
        assert!(require_permission(&moderator, Permission::PropertiesView).is_ok());
        assert!(matches!(
            require_permission(&moderator, Permission::UsersManage),
            Err(ApiError::InsufficientPermissions)
        ));

        let root = UserIdentity::new("u-3", "root@example.com", Role::SuperAdmin);
        assert!(require_permission(&root, Permission::RolesManage).is_ok());
    }
}
