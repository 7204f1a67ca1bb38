//! Raw status-and-body result of one Web API exchange.

/// Status code and body of one HTTP exchange.
///
/// `body` is `None` only when a caller-built request function has no body to
/// report; [`TransportClient`](super::TransportClient) always reads the body,
/// so an empty response arrives as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: Option<String>,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: Option<String>) -> Self {
        Self { status, body }
    }

    /// Creates a `200 OK` response carrying `body`.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, Some(body.into()))
    }

    /// Returns `true` for exactly `200` with a body present.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200 && self.body.is_some()
    }

    /// Returns `true` when the server signals a missing or expired session (403).
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.status == 403
    }
}
