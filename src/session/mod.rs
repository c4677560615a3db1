/// Session store: the bearer token and role of the signed-in operator.
///
/// The only component that reads or writes the `token` and `role` storage
/// keys. Everything else (route guard, request interceptor, flows) goes
/// through a cloned [`SessionStore`] handle that shares the same backing
/// [`Storage`].
///
/// No validation of token structure or expiry is done here. Presence of a
/// non-empty token is taken as a valid session until the backend rejects a
/// request.
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::storage::Storage;

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Operator role as reported by the backend at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Interpret a backend role string. Anything other than `admin` is a
    /// regular user.
    pub fn parse(value: &str) -> Self {
        if value == "admin" {
            Self::Admin
        } else {
            Self::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

/// Shared handle to the persisted session.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persist a new session, replacing any previous one. If the role cannot
    /// be written the token is removed again, so no half session remains.
    pub fn set_session(&self, token: &str, role: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)?;
        if let Err(err) = self.storage.set(ROLE_KEY, role) {
            let _ = self.storage.remove(TOKEN_KEY);
            return Err(err);
        }
        Ok(())
    }

    /// The stored bearer token. An empty stored value counts as absent.
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// The stored role string, verbatim.
    pub fn role(&self) -> Option<String> {
        self.storage.get(ROLE_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Remove token and role.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(ROLE_KEY)
    }

    /// The backing storage, for flows that persist their own keys.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("role", &self.role())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
