//! Portal route guards.
//!
//! Each portal fronts its protected pages with a guard. A guard looks at the
//! session and decides whether to render the page, hold (initial resolution
//! still running), or redirect to a login surface.
//!
//! A signed-in user who reaches a portal their role does not belong to is
//! signed out and sent to their own portal's login: a session opened on one
//! portal never browses another portal's pages, not even read-only.

use crate::config::PortalRoutes;
use crate::identity::UserIdentity;
use crate::role::{Portal, Role};
use crate::session::{AuthPhase, AuthSnapshot, SessionContext, SignOutReason};
use serde::Serialize;
use tracing::{debug, info};
use url::form_urlencoded;

/// Guard variant, one per protected area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    /// Admin portal shell.
    Admin,
    /// Customer account pages.
    Customer,
    /// Agent dashboard.
    Vendor,
    /// Sub-admin area.
    SubAdmin,
}

impl GuardKind {
    /// Portal whose login surface this guard sends anonymous users to.
    pub fn portal(self) -> Portal {
        match self {
            Self::Admin | Self::SubAdmin => Portal::Admin,
            Self::Customer => Portal::Customer,
            Self::Vendor => Portal::Vendor,
        }
    }

    /// Whether this guard lets `user` in.
    pub fn admits(self, user: &UserIdentity) -> bool {
        let by_role = match (&user.role, self) {
            (Role::SuperAdmin, _) => true,
            (Role::Admin, Self::Admin) => true,
            (Role::Customer, Self::Customer) => true,
            (Role::Agent, Self::Vendor) => true,
            (Role::SubAdmin, Self::SubAdmin) => true,
            (Role::Customer | Role::Agent | Role::Admin | Role::SubAdmin | Role::Custom(_), _) => {
                false
            }
        };
        // Custom permission sets open the admin shell; pages narrow further.
        by_role || (self == Self::Admin && user.has_custom_permissions())
    }

    /// Classify a session snapshot for this guard.
    pub fn classify(self, snapshot: &AuthSnapshot) -> GuardState {
        match &snapshot.phase {
            AuthPhase::Loading => GuardState::Loading,
            AuthPhase::Anonymous => GuardState::Unauthenticated,
            AuthPhase::Authenticated(user) if self.admits(user) => GuardState::Authorized,
            AuthPhase::Authenticated(_) => GuardState::WrongPortal,
        }
    }
}

/// Guard state for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Session still resolving.
    Loading,
    /// Nobody signed in.
    Unauthenticated,
    /// Signed in with a role that belongs elsewhere.
    WrongPortal,
    /// Admitted.
    Authorized,
}

/// Why a guard redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Nobody signed in.
    Unauthenticated,
    /// Role belongs to another portal.
    WrongPortal,
}

/// Redirect to a login surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// Login path.
    pub to: String,
    /// Location to return to after login.
    pub from: Option<String>,
    /// Message to show on the login surface.
    pub message: Option<String>,
    /// Why the guard redirected.
    pub reason: RedirectReason,
}

impl Redirect {
    /// Target URL with `from` and `message` as query parameters.
    pub fn location(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(from) = &self.from {
            query.append_pair("from", from);
        }
        if let Some(message) = &self.message {
            query.append_pair("message", message);
        }
        let query = query.finish();

        if query.is_empty() {
            self.to.clone()
        } else {
            format!("{}?{}", self.to, query)
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Resolution still running; render a placeholder.
    Pending,
    /// Render the protected page for this user.
    Render(UserIdentity),
    /// Leave for a login surface.
    Redirect(Redirect),
}

/// A configured guard.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    kind: GuardKind,
    routes: PortalRoutes,
}

impl RouteGuard {
    /// Create a guard.
    pub fn new(kind: GuardKind, routes: PortalRoutes) -> Self {
        Self { kind, routes }
    }

    /// Guard variant.
    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    /// Decide what to do with a navigation to `location`.
    ///
    /// A portal mismatch clears `session` before redirecting.
    pub fn check(&self, session: &SessionContext, location: &str) -> GuardOutcome {
        let snapshot = session.snapshot();

        match self.kind.classify(&snapshot) {
            GuardState::Loading => {
                debug!(guard = ?self.kind, "Session still resolving");
                GuardOutcome::Pending
            }
            GuardState::Unauthenticated => GuardOutcome::Redirect(Redirect {
                to: self.routes.login_path(self.kind.portal()).to_string(),
                from: Some(location.to_string()),
                message: snapshot.ended.and_then(SignOutReason::notice).map(String::from),
                reason: RedirectReason::Unauthenticated,
            }),
            GuardState::WrongPortal => {
                let Some(user) = snapshot.user() else {
                    return GuardOutcome::Pending;
                };
                let home = user.role.home_portal();
                info!(
                    guard = ?self.kind,
                    user_id = %user.id,
                    role = %user.role,
                    home_portal = %home,
                    "Portal mismatch, clearing session"
                );
                session.clear_if_current(snapshot.epoch, SignOutReason::PortalMismatch);

                GuardOutcome::Redirect(Redirect {
                    to: self.routes.login_path(home).to_string(),
                    from: None,
                    message: Some(mismatch_message(&user.role, self.kind.portal())),
                    reason: RedirectReason::WrongPortal,
                })
            }
            GuardState::Authorized => match snapshot.phase {
                AuthPhase::Authenticated(user) => GuardOutcome::Render(user),
                AuthPhase::Loading | AuthPhase::Anonymous => GuardOutcome::Pending,
            },
        }
    }
}

/// Message shown when a `role` account turns up on the `attempted` portal.
pub fn mismatch_message(role: &Role, attempted: Portal) -> String {
    let home = role.home_portal();
    if home == attempted {
        // Same portal, but the account has no access to this area.
        format!(
            "Your {} account does not have access to this area. Please sign in with an authorized account.",
            role
        )
    } else {
        format!(
            "This is the {} portal. Your {} account belongs to the {} portal; please sign in there.",
            attempted, role, home
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::Permission;
    use test_case::test_case;

    fn guard(kind: GuardKind) -> RouteGuard {
        RouteGuard::new(kind, PortalRoutes::default())
    }

    fn user(role: Role) -> UserIdentity {
        UserIdentity::new("u-1", "u@example.com", role)
    }

    fn signed_in(role: Role) -> SessionContext {
        let session = SessionContext::new();
        session.login(user(role));
        session
    }

    #[test_case(GuardKind::Admin, "/admin/login" ; "admin")]
    #[test_case(GuardKind::Customer, "/login" ; "customer")]
    #[test_case(GuardKind::Vendor, "/vendor/login" ; "vendor")]
    #[test_case(GuardKind::SubAdmin, "/admin/login" ; "subadmin")]
    fn test_unauthenticated_redirects_to_own_login(kind: GuardKind, login: &str) {
        let session = SessionContext::new();
        match guard(kind).check(&session, "/protected/page") {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(redirect.to, login);
                assert_eq!(redirect.from.as_deref(), Some("/protected/page"));
                assert_eq!(redirect.message, None);
                assert_eq!(redirect.reason, RedirectReason::Unauthenticated);
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test_case(GuardKind::Admin, Role::Admin, true)]
    #[test_case(GuardKind::Admin, Role::SuperAdmin, true)]
    #[test_case(GuardKind::Admin, Role::Agent, false)]
    #[test_case(GuardKind::Admin, Role::Customer, false)]
    #[test_case(GuardKind::Admin, Role::SubAdmin, false)]
    #[test_case(GuardKind::Customer, Role::Customer, true)]
    #[test_case(GuardKind::Customer, Role::SuperAdmin, true)]
    #[test_case(GuardKind::Customer, Role::Agent, false)]
    #[test_case(GuardKind::Vendor, Role::Agent, true)]
    #[test_case(GuardKind::Vendor, Role::SuperAdmin, true)]
    #[test_case(GuardKind::Vendor, Role::Admin, false)]
    #[test_case(GuardKind::SubAdmin, Role::SubAdmin, true)]
    #[test_case(GuardKind::SubAdmin, Role::SuperAdmin, true)]
    #[test_case(GuardKind::SubAdmin, Role::Admin, false)]
    fn test_admission_matrix(kind: GuardKind, role: Role, admitted: bool) {
        assert_eq!(kind.admits(&user(role)), admitted);
    }

    #[test]
    fn test_custom_role_with_permissions_enters_admin_shell_only() {
        let moderator = user(Role::Custom("moderator".into()))
            .with_permissions([Permission::PropertiesView]);
        assert!(GuardKind::Admin.admits(&moderator));
        assert!(!GuardKind::Vendor.admits(&moderator));
        assert!(!GuardKind::SubAdmin.admits(&moderator));
    }

    #[test]
    fn test_custom_role_without_permissions_is_wrong_portal() {
        let session = signed_in(Role::Custom("ghost".into()));
        let snapshot = session.snapshot();
        assert_eq!(GuardKind::Admin.classify(&snapshot), GuardState::WrongPortal);

        match guard(GuardKind::Admin).check(&session, "/admin/dashboard") {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(redirect.reason, RedirectReason::WrongPortal);
                assert_eq!(redirect.to, "/admin/login");
                assert!(redirect.message.unwrap().contains("does not have access"));
            }
            other => panic!("expected redirect, got {:?}", other),
        }
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_agent_on_admin_guard_goes_to_vendor_login() {
        let session = signed_in(Role::Agent);

        match guard(GuardKind::Admin).check(&session, "/admin/users") {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(redirect.to, "/vendor/login");
                assert_eq!(redirect.from, None);
                assert_eq!(redirect.reason, RedirectReason::WrongPortal);
                let message = redirect.message.unwrap();
                assert!(message.contains("vendor portal"));
            }
            other => panic!("expected redirect, got {:?}", other),
        }

        assert!(!session.is_authenticated());
        assert_eq!(session.ended(), Some(SignOutReason::PortalMismatch));
    }

    #[test]
    fn test_customer_on_vendor_guard_goes_to_customer_login() {
        let session = signed_in(Role::Customer);
        match guard(GuardKind::Vendor).check(&session, "/vendor/listings") {
            GuardOutcome::Redirect(redirect) => assert_eq!(redirect.to, "/login"),
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_authorized_renders_user() {
        let session = signed_in(Role::Admin);
        match guard(GuardKind::Admin).check(&session, "/admin/dashboard") {
            GuardOutcome::Render(user) => assert_eq!(user.role, Role::Admin),
            other => panic!("expected render, got {:?}", other),
        }
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_superadmin_passes_every_guard() {
        let session = signed_in(Role::SuperAdmin);
        for kind in [GuardKind::Admin, GuardKind::Customer, GuardKind::Vendor, GuardKind::SubAdmin] {
            assert!(matches!(guard(kind).check(&session, "/x"), GuardOutcome::Render(_)));
        }
    }

    #[test]
    fn test_loading_is_pending() {
        let session = SessionContext::new();
        session.begin_resolution();
        assert_eq!(guard(GuardKind::Customer).check(&session, "/account"), GuardOutcome::Pending);
    }

    #[test]
    fn test_inactivity_notice_carried_to_login() {
        let session = signed_in(Role::Admin);
        session.clear(SignOutReason::Inactivity);

        match guard(GuardKind::Admin).check(&session, "/admin/dashboard") {
            GuardOutcome::Redirect(redirect) => {
                assert_eq!(
                    redirect.message.as_deref(),
                    Some("You have been logged out due to inactivity.")
                );
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_redirect_location_encodes_query() {
        let redirect = Redirect {
            to: "/vendor/login".into(),
            from: Some("/admin/users?page=2".into()),
            message: Some("Use the vendor portal".into()),
            reason: RedirectReason::WrongPortal,
        };
        assert_eq!(
            redirect.location(),
            "/vendor/login?from=%2Fadmin%2Fusers%3Fpage%3D2&message=Use+the+vendor+portal"
        );

        let bare = Redirect { from: None, message: None, ..redirect };
        assert_eq!(bare.location(), "/vendor/login");
    }
}
