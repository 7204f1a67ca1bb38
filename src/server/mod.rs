//! Server identities and per-server connection settings.
//!
//! A [`ServerConfig`] is the full snapshot the rest of the crate reads when it
//! builds a transport client or logs in. Snapshots are owned by the
//! [`registry::ServerRegistry`]; the orchestrator never keeps credentials
//! beyond the single operation that read them.

pub mod registry;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigError;
use crate::transport::DEFAULT_TIMEOUT_SECS;

/// Largest accepted request timeout (1 hour).
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Opaque key identifying one configured server.
///
/// Immutable for as long as the server stays in the registry. An id may be
/// reused after removal; the reused id starts with a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(u32);

impl ServerId {
    /// Wraps a raw numeric id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for ServerId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extra header sent with every request to a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeader {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// HTTP basic authentication in front of the Web UI (usually a reverse proxy).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Basic-auth user name.
    pub username: String,
    /// Basic-auth password, if any.
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Connection settings for one qBittorrent server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Registry key.
    pub id: ServerId,
    /// Human readable label.
    #[serde(default)]
    pub name: Option<String>,
    /// Web UI base URL, optionally with a reverse-proxy path prefix.
    pub base_url: String,
    /// Web UI user name. `None` means anonymous access (auth bypass on the server).
    #[serde(default)]
    pub username: Option<String>,
    /// Web UI password.
    #[serde(default)]
    pub password: Option<String>,
    /// Headers added to every request.
    #[serde(default)]
    pub custom_headers: Vec<CustomHeader>,
    /// Optional basic auth applied to every request.
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
    /// Connect and total request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("custom_headers", &self.custom_headers)
            .field("basic_auth", &self.basic_auth)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Creates an anonymous configuration with the default timeout.
    #[must_use]
    pub fn new(id: ServerId, base_url: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            base_url: base_url.into(),
            username: None,
            password: None,
            custom_headers: Vec::new(),
            basic_auth: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the Web UI credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push(CustomHeader {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Enables HTTP basic auth for every request.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password,
        });
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns the credentials to log in with, or `None` for anonymous access.
    ///
    /// A server counts as anonymous when no user name is set (or it is empty).
    /// A missing password is sent as an empty string.
    #[must_use]
    pub fn login_credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|name| !name.is_empty())?;
        Some((username, self.password.as_deref().unwrap_or("")))
    }

    /// Returns the label shown to users: the name if set, else the base URL.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.base_url)
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks the snapshot for values a client could never be built from.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the base URL is not an absolute http(s)
    /// URL, the timeout is outside `1..=3600` seconds, or basic auth is
    /// enabled without a user name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidBaseUrl {
            server: self.id,
            url: self.base_url.clone(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                server: self.id,
                scheme: parsed.scheme().to_string(),
            });
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::InvalidTimeout {
                server: self.id,
                value: self.timeout_secs,
            });
        }
        if self
            .basic_auth
            .as_ref()
            .is_some_and(|auth| auth.username.trim().is_empty())
        {
            return Err(ConfigError::BasicAuthWithoutUsername { server: self.id });
        }
        Ok(())
    }
}
