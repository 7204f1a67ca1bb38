//! Login request and response classification.

use std::fmt;

use tracing::{debug, instrument};

use crate::server::ServerConfig;
use crate::transport::{ApiResponse, LOGIN_ENDPOINT, TransportClient, TransportError};

/// Body the auth endpoint returns for accepted credentials.
pub const LOGIN_SUCCESS_BODY: &str = "Ok.";

/// Body the auth endpoint returns for rejected credentials.
pub const LOGIN_FAILURE_BODY: &str = "Fails.";

/// Result of one login exchange, classified from status and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The server accepted the credentials and set a session cookie.
    Success,
    /// Wrong user name or password.
    InvalidCredentials,
    /// The server refused the attempt with 403 (IP banned after repeated failures).
    Banned,
    /// The server answered with a body this client does not recognize.
    Unknown(String),
}

impl LoginOutcome {
    /// Returns `true` for [`LoginOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Classifies an auth endpoint response.
///
/// Status 403 wins over any body. An empty body is treated like an absent one.
#[must_use]
pub fn classify_login(status: u16, body: Option<&str>) -> LoginOutcome {
    if status == 403 {
        return LoginOutcome::Banned;
    }
    match body {
        Some(LOGIN_SUCCESS_BODY) => LoginOutcome::Success,
        Some(LOGIN_FAILURE_BODY | "") | None => LoginOutcome::InvalidCredentials,
        Some(other) => LoginOutcome::Unknown(other.to_string()),
    }
}

/// Login credentials captured from a configuration snapshot.
#[derive(Clone)]
pub(crate) struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Captures the credentials of `config`, or `None` for anonymous access.
    pub(crate) fn from_config(config: &ServerConfig) -> Option<Self> {
        config
            .login_credentials()
            .map(|(username, password)| Self {
                username: username.to_string(),
                password: password.to_string(),
            })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Posts credentials to the auth endpoint and classifies the answer.
///
/// Anonymous servers succeed immediately without touching the network. On
/// success the `SID` cookie lands in the client's jar, so later requests on
/// the same client are authenticated.
///
/// # Errors
///
/// Returns [`TransportError`] when the exchange itself fails.
#[instrument(level = "debug", skip_all, fields(base_url = %client.base_url()))]
pub(crate) async fn perform_login(
    client: &TransportClient,
    credentials: Option<&Credentials>,
) -> Result<LoginOutcome, TransportError> {
    let Some(credentials) = credentials else {
        debug!("no credentials configured, using anonymous access");
        return Ok(LoginOutcome::Success);
    };

    let ApiResponse { status, body } = client
        .post_form(
            LOGIN_ENDPOINT,
            &[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ],
        )
        .await?;

    let outcome = classify_login(status, body.as_deref());
    debug!(status, ?outcome, "login response classified");
    Ok(outcome)
}
