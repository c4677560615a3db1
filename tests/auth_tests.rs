/// Sign-in, sign-out and bearer-token interceptor tests against a mock
/// backend.
mod common;

use common::{MockBackend, client_for, unreachable_base_url};
use elt_console::api::ApiClient;
use elt_console::auth::AuthClient;
use elt_console::flows::data_view::DATA_VIEW_KEY;
use elt_console::flows::{FlowError, INVALID_CREDENTIALS_MESSAGE};
use elt_console::router::{GuardDecision, Route, RouteGuard};
use elt_console::session::{ROLE_KEY, SessionStore, TOKEN_KEY};
use elt_console::storage::{MemoryStorage, Storage};
use std::sync::Arc;

fn login_backend() -> MockBackend {
    MockBackend::start(|req| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/auth/login") => {
            let body: serde_json::Value =
                serde_json::from_slice(&req.body).unwrap_or_default();
            match (body["username"].as_str(), body["password"].as_str()) {
                (Some("admin"), Some("admin123")) => {
                    (200, r#"{"token":"abc","role":"admin"}"#.to_string())
                }
                (Some("user"), Some("user123")) => {
                    (200, r#"{"token":"xyz","role":"user"}"#.to_string())
                }
                _ => (401, r#"{"error":"Invalid credentials"}"#.to_string()),
            }
        }
        ("GET", "/logs") => (200, r#"{"logs":[]}"#.to_string()),
        _ => (404, r#"{"error":"not found"}"#.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn admin_login_stores_session_and_lands_on_admin_dashboard() {
    let backend = login_backend();
    let (api, session, storage) = client_for(&backend);
    let auth = AuthClient::new(api, session);

    let outcome = auth.login("admin", "admin123").unwrap();

    assert_eq!(outcome.role, "admin");
    assert_eq!(outcome.landing, Route::Admin);
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc"));
    assert_eq!(storage.get(ROLE_KEY).as_deref(), Some("admin"));
    assert!(auth.is_authenticated());
    assert_eq!(auth.landing(), Some(Route::Admin));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0]
            .content_type
            .as_deref()
            .unwrap_or_default()
            .starts_with("application/json")
    );
    assert!(requests[0].authorization.is_none());
}

#[test]
fn user_login_lands_on_user_dashboard() {
    let backend = login_backend();
    let (api, session, _) = client_for(&backend);

    let outcome = AuthClient::new(api, session).login("user", "user123").unwrap();
    assert_eq!(outcome.landing, Route::User);
}

#[test]
fn unknown_role_lands_on_user_dashboard() {
    let backend = MockBackend::start(|_| (200, r#"{"token":"t","role":"auditor"}"#.to_string()));
    let (api, session, storage) = client_for(&backend);

    let outcome = AuthClient::new(api, session).login("a", "b").unwrap();
    assert_eq!(outcome.landing, Route::User);
    assert_eq!(storage.get(ROLE_KEY).as_deref(), Some("auditor"));
}

#[test]
fn rejected_login_leaves_storage_untouched() {
    let backend = login_backend();
    let (api, session, storage) = client_for(&backend);
    let auth = AuthClient::new(api, session);

    let err = auth.login("admin", "wrong").unwrap_err();

    assert!(matches!(err, FlowError::InvalidCredentials));
    assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
    assert!(storage.get(TOKEN_KEY).is_none());
    assert!(storage.get(ROLE_KEY).is_none());
    assert!(!auth.is_authenticated());
}

#[test]
fn rejected_login_keeps_previous_session() {
    let backend = login_backend();
    let (api, session, storage) = client_for(&backend);
    session.set_session("old", "user").unwrap();

    let err = AuthClient::new(api, session).login("admin", "nope").unwrap_err();

    assert!(matches!(err, FlowError::InvalidCredentials));
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("old"));
    assert_eq!(storage.get(ROLE_KEY).as_deref(), Some("user"));
}

#[test]
fn unreachable_backend_reads_as_invalid_credentials() {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let session = SessionStore::new(Arc::clone(&storage));
    let api = ApiClient::new(&unreachable_base_url(), session.clone());

    let err = AuthClient::new(api, session).login("admin", "admin123").unwrap_err();

    assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);
    assert!(storage.get(TOKEN_KEY).is_none());
}

#[test]
fn empty_token_is_rejected() {
    let backend = MockBackend::start(|_| (200, r#"{"token":"","role":"admin"}"#.to_string()));
    let (api, session, storage) = client_for(&backend);

    let err = AuthClient::new(api, session).login("admin", "admin123").unwrap_err();
    assert!(matches!(err, FlowError::InvalidCredentials));
    assert!(storage.get(TOKEN_KEY).is_none());
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[test]
fn logout_clears_session_and_preview() {
    let backend = login_backend();
    let (api, session, storage) = client_for(&backend);
    let auth = AuthClient::new(api, session.clone());

    auth.login("admin", "admin123").unwrap();
    storage.set(DATA_VIEW_KEY, r#"{"columns":[],"rows":[]}"#).unwrap();

    auth.logout().unwrap();

    assert!(storage.get(TOKEN_KEY).is_none());
    assert!(storage.get(ROLE_KEY).is_none());
    assert!(storage.get(DATA_VIEW_KEY).is_none());
    assert_eq!(
        RouteGuard::new(session).check(Route::Admin),
        GuardDecision::Redirect(Route::Login)
    );
}

#[test]
fn logout_without_session_is_a_no_op() {
    let backend = login_backend();
    let (api, session, _) = client_for(&backend);

    AuthClient::new(api, session).logout().unwrap();
    assert_eq!(backend.request_count(), 0);
}

// ---------------------------------------------------------------------------
// Interceptor
// ---------------------------------------------------------------------------

#[test]
fn requests_after_login_carry_bearer_token() {
    let backend = login_backend();
    let (api, session, _) = client_for(&backend);
    AuthClient::new(api.clone(), session).login("admin", "admin123").unwrap();

    api.logs().unwrap();

    let requests = backend.requests();
    let logs = requests.iter().find(|r| r.path == "/logs").unwrap();
    assert_eq!(logs.authorization.as_deref(), Some("Bearer abc"));
}

#[test]
fn requests_without_session_have_no_authorization_header() {
    let backend = login_backend();
    let (api, _, _) = client_for(&backend);

    api.logs().unwrap();

    assert!(backend.requests()[0].authorization.is_none());
}

#[test]
fn interceptor_reads_token_at_request_time() {
    let backend = login_backend();
    let (api, session, _) = client_for(&backend);

    session.set_session("first", "admin").unwrap();
    api.logs().unwrap();
    session.set_session("second", "admin").unwrap();
    api.logs().unwrap();
    session.clear().unwrap();
    api.logs().unwrap();

    let auth: Vec<Option<String>> = backend
        .requests()
        .into_iter()
        .map(|r| r.authorization)
        .collect();
    assert_eq!(
        auth,
        vec![
            Some("Bearer first".to_string()),
            Some("Bearer second".to_string()),
            None
        ]
    );
}
