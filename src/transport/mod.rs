//! Cookie-backed HTTP transport bound to one qBittorrent server.
//!
//! A [`TransportClient`] owns its own cookie jar, so a successful login on
//! one client authenticates every later request made through that same
//! client and no other.
//!
//! # Example
//!
//! ```no_run
//! use qbremote_core::{ServerConfig, ServerId, TransportClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::new(ServerId::new(1), "http://localhost:8080");
//! let client = TransportClient::for_server(&config)?;
//! let response = client.get("api/v2/app/version", &[]).await?;
//! println!("HTTP {} {:?}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod response;

pub use client::TransportClient;
pub use constants::{
    DEFAULT_TIMEOUT_SECS, LOGIN_ENDPOINT, LOGOUT_ENDPOINT, SESSION_COOKIE, VERSION_ENDPOINT,
};
pub use error::TransportError;
pub use response::ApiResponse;

// Note: no module-local Result alias; signatures spell out `Result<T, TransportError>`.
