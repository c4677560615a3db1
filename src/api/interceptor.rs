/// Request interceptor that attaches the session's bearer token.
///
/// Installed once on the shared `ureq::Agent`, so every outgoing request
/// passes through it. When the session holds no token the request goes out
/// untouched and the backend decides whether to reject it. No refresh and no
/// retry on `401`.
use ureq::{Middleware, MiddlewareNext, Request, Response};

use crate::session::SessionStore;

pub struct BearerAuth {
    session: SessionStore,
}

impl BearerAuth {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Header value for the current session, if any.
    pub fn header_value(&self) -> Option<String> {
        self.session.token().map(|token| format!("Bearer {token}"))
    }
}

impl Middleware for BearerAuth {
    fn handle(&self, request: Request, next: MiddlewareNext) -> Result<Response, ureq::Error> {
        let request = match self.header_value() {
            Some(value) => request.set("Authorization", &value),
            None => request,
        };
        next.handle(request)
    }
}
