/// Operator flows: one self-contained interaction sequence each.
///
/// Flows share only the session store and the API client's interceptor.
/// Each one maps its own failures into a [`FlowError`] that the CLI prints
/// as-is:
///
/// - local validation failures (no file selected, no token) never touch the
///   network
/// - backend and transport failures carry the flow's own message, built
///   from the backend `error` detail where the flow wants it
/// - a rejected login is always the generic invalid-credentials message
pub mod dashboard;
pub mod data_view;
pub mod history;
pub mod logs;
pub mod trigger;

use thiserror::Error;

use crate::api::ApiError;
use crate::session::SessionStore;

pub const NO_FILE_MESSAGE: &str = "Please select a YAML file first.";
pub const MISSING_TOKEN_MESSAGE: &str = "JWT token missing";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Please select a YAML file first.")]
    NoFileSelected,
    #[error("JWT token missing")]
    MissingToken,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: ApiError,
    },
    #[error("failed to update local storage: {0:#}")]
    Storage(anyhow::Error),
}

impl FlowError {
    pub(crate) fn backend(message: impl Into<String>, source: ApiError) -> Self {
        Self::Backend {
            message: message.into(),
            source,
        }
    }

    /// True for failures detected before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::NoFileSelected | Self::MissingToken)
    }
}

/// Token check some flows run on activation. The route guard is the real
/// authorization boundary; this only keeps a flow from firing requests it
/// knows the backend will reject.
pub fn require_token(session: &SessionStore) -> Result<String, FlowError> {
    session.token().ok_or(FlowError::MissingToken)
}

/// Write a failure to the developer console.
pub(crate) fn console_error(context: &str, err: &ApiError) {
    eprintln!("{context}: {err}");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn messages() {
        assert_eq!(FlowError::NoFileSelected.to_string(), NO_FILE_MESSAGE);
        assert_eq!(FlowError::MissingToken.to_string(), MISSING_TOKEN_MESSAGE);
        assert_eq!(
            FlowError::InvalidCredentials.to_string(),
            INVALID_CREDENTIALS_MESSAGE
        );
        let backend = FlowError::backend(
            "Failed to load data view",
            ApiError::Transport("connection refused".into()),
        );
        assert_eq!(backend.to_string(), "Failed to load data view");
        assert!(!backend.is_local());
        assert!(FlowError::MissingToken.is_local());
    }

    #[test]
    fn require_token_reads_session() {
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            require_token(&session),
            Err(FlowError::MissingToken)
        ));
        session.set_session("abc", "user").unwrap();
        assert_eq!(require_token(&session).unwrap(), "abc");
    }
}
