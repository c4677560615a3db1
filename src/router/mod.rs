/// Console routes and the authentication guard in front of them.
///
/// Every route except [`Route::Login`] is protected. The guard reads the
/// session store on every check and never caches a decision, so a logout
/// takes effect on the very next navigation.
use std::fmt;

use crate::session::{Role, SessionStore};

/// A view the operator can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Admin,
    User,
    Logs,
    ConfigHistory,
    DataView,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Login,
        Route::Admin,
        Route::User,
        Route::Logs,
        Route::ConfigHistory,
        Route::DataView,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Admin => "/admin",
            Self::User => "/user",
            Self::Logs => "/logs",
            Self::ConfigHistory => "/config-history",
            Self::DataView => "/data-view",
        }
    }

    /// Human-readable view name.
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Admin => "Admin dashboard",
            Self::User => "User dashboard",
            Self::Logs => "Job logs",
            Self::ConfigHistory => "Configuration history",
            Self::DataView => "Data view",
        }
    }

    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Landing route after a successful login.
    pub fn landing_for(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::User => Self::User,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

impl GuardDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Authentication guard evaluated before entering a route.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
}

impl RouteGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn check(&self, route: Route) -> GuardDecision {
        if !route.is_protected() || self.session.is_authenticated() {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect(Route::Login)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;

    fn guard() -> (RouteGuard, SessionStore) {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        (RouteGuard::new(session.clone()), session)
    }

    #[test]
    fn empty_session_redirects_every_protected_route() {
        let (guard, _) = guard();
        for route in Route::ALL.into_iter().filter(|r| r.is_protected()) {
            assert_eq!(
                guard.check(route),
                GuardDecision::Redirect(Route::Login),
                "{route} should be denied"
            );
        }
    }

    #[test]
    fn login_route_is_always_open() {
        let (guard, _) = guard();
        assert_eq!(guard.check(Route::Login), GuardDecision::Allow);
    }

    #[test]
    fn session_allows_every_route() {
        let (guard, session) = guard();
        session.set_session("token", "user").unwrap();
        for route in Route::ALL {
            assert!(guard.check(route).is_allowed(), "{route} should be allowed");
        }
    }

    #[test]
    fn guard_rereads_session_on_each_check() {
        let (guard, session) = guard();
        session.set_session("token", "admin").unwrap();
        assert!(guard.check(Route::Logs).is_allowed());

        session.clear().unwrap();
        assert_eq!(guard.check(Route::Logs), GuardDecision::Redirect(Route::Login));
    }

    #[test]
    fn landing_depends_on_role() {
        assert_eq!(Route::landing_for(Role::Admin), Route::Admin);
        assert_eq!(Route::landing_for(Role::User), Route::User);
        assert_eq!(Route::landing_for(Role::parse("operator")), Route::User);
    }

    #[test]
    fn route_paths() {
        assert_eq!(Route::ConfigHistory.to_string(), "/config-history");
        assert_eq!(Route::DataView.path(), "/data-view");
    }
}
