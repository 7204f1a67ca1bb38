//! The tagged failure type returned to callers of the orchestrator.

use thiserror::Error;

use crate::server::ServerId;
use crate::session::LoginOutcome;
use crate::transport::TransportError;

/// Why a request through the orchestrator did not produce a body.
///
/// Each variant renders a distinct message a UI can show as-is.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The id is not present in the server registry.
    #[error("server {server} is not configured")]
    UnknownServer {
        /// The id that was looked up.
        server: ServerId,
    },

    /// The server could not be reached (refused, DNS, TLS, timeout).
    #[error("server unreachable: {0}")]
    Network(#[from] TransportError),

    /// The server answered with a status other than 200, or 200 without a body.
    #[error("server returned HTTP {status}")]
    Api {
        /// The HTTP status code.
        status: u16,
    },

    /// The configured user name or password was rejected.
    #[error("wrong username or password")]
    InvalidCredentials,

    /// The server refused the login with 403 after too many failed attempts.
    #[error("banned by the server after too many failed login attempts")]
    Banned,

    /// The login endpoint answered with text this client does not recognize.
    #[error("unexpected login response: {body}")]
    UnknownLoginResponse {
        /// The body as returned.
        body: String,
    },

    /// The body was received but did not match the expected JSON shape.
    #[error("cannot decode response: {source}")]
    Decode {
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl RequestError {
    /// Maps a non-success login outcome to its error, `None` for success.
    #[must_use]
    pub fn from_login(outcome: LoginOutcome) -> Option<Self> {
        match outcome {
            LoginOutcome::Success => None,
            LoginOutcome::InvalidCredentials => Some(Self::InvalidCredentials),
            LoginOutcome::Banned => Some(Self::Banned),
            LoginOutcome::Unknown(body) => Some(Self::UnknownLoginResponse { body }),
        }
    }

    /// Returns `true` for the login-related variants.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::Banned | Self::UnknownLoginResponse { .. }
        )
    }

    /// Returns `true` when the server could not be reached.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns the HTTP status of an [`RequestError::Api`] failure.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status } => Some(*status),
            _ => None,
        }
    }
}
