//! Error types for the transport module.
//!
//! These cover everything that can go wrong before an HTTP status code is
//! available. Status codes themselves are never errors at this layer; they are
//! classified by the orchestrator.

use thiserror::Error;

/// Errors that can occur while building a client or exchanging a request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("cannot build HTTP client: {source}")]
    Build {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The base URL or an endpoint path does not form a valid URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL text.
        url: String,
    },

    /// A configured custom header has an invalid name or value.
    #[error("invalid custom header '{name}'")]
    InvalidHeader {
        /// The header name as configured.
        name: String,
    },

    /// The request did not complete within the server's timeout.
    #[error("timeout contacting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Connection-level failure (DNS, refused connection, TLS, broken body).
    #[error("network error contacting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Creates a client-build error.
    pub fn build(source: reqwest::Error) -> Self {
        Self::Build { source }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Classifies a reqwest send/read failure as timeout or network error.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Returns `true` for [`TransportError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// Note: no `From<reqwest::Error>`. Every variant needs the URL (or header name)
// for context, which the source error does not carry reliably; the constructor
// helpers above attach it at the call site.
