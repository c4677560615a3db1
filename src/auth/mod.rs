/// Auth client: credential exchange, logout and session queries.
///
/// `login` is coarse: any failure (rejected credentials,
/// unreachable backend, malformed response) becomes the same
/// [`FlowError::InvalidCredentials`], and the session store is left exactly
/// as it was. No retry, no rate limiting, no lockout.
use crate::api::ApiClient;
use crate::api::types::Credentials;
use crate::flows::FlowError;
use crate::flows::data_view;
use crate::router::Route;
use crate::session::{Role, SessionStore};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Role string as returned by the backend.
    pub role: String,
    /// Dashboard to navigate to.
    pub landing: Route,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
    session: SessionStore,
}

impl AuthClient {
    pub fn new(api: ApiClient, session: SessionStore) -> Self {
        Self { api, session }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, FlowError> {
        let credentials = Credentials::new(username, password);
        let response = self
            .api
            .login(&credentials)
            .map_err(|_| FlowError::InvalidCredentials)?;

        if response.token.is_empty() {
            return Err(FlowError::InvalidCredentials);
        }

        self.session
            .set_session(&response.token, &response.role)
            .map_err(FlowError::Storage)?;

        Ok(LoginOutcome {
            landing: Route::landing_for(Role::parse(&response.role)),
            role: response.role,
        })
    }

    /// Drop the session and the persisted data preview.
    pub fn logout(&self) -> anyhow::Result<()> {
        self.session.clear()?;
        data_view::clear_preview(self.session.storage().as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn role(&self) -> Option<String> {
        self.session.role()
    }

    /// Where an already signed-in operator lands.
    pub fn landing(&self) -> Option<Route> {
        self.is_authenticated()
            .then(|| Route::landing_for(Role::parse(&self.role().unwrap_or_default())))
    }
}
