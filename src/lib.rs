//! qBittorrent Remote Core Library
//!
//! This library keeps one authenticated Web API session per configured
//! qBittorrent server and runs caller-supplied requests through it, logging
//! in lazily, retrying once when a session silently expires, and caching each
//! server's application version.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`server`] - Server identities, connection settings and the registry
//! - [`transport`] - Cookie-backed HTTP client bound to one server
//! - [`session`] - Per-server login state, locks and login classification
//! - [`version`] - Application version parsing and the cached version entry
//! - [`orchestrator`] - The ensure-login, call, retry-once request protocol
//! - [`config`] - Loading the JSON server list from disk
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qbremote_core::{
//!     OrchestratorOptions, RequestOrchestrator, ServerConfig, ServerId, ServerRegistry,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ServerRegistry::new());
//! registry.add(
//!     ServerConfig::new(ServerId::new(1), "http://localhost:8080")
//!         .with_credentials("admin", "adminadmin"),
//! )?;
//!
//! let orchestrator = RequestOrchestrator::attach(&registry, OrchestratorOptions::default());
//! let body = orchestrator
//!     .execute(ServerId::new(1), |client| async move {
//!         client.get("api/v2/torrents/info", &[("filter", "downloading")]).await
//!     })
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod orchestrator;
pub mod server;
pub mod session;
pub mod transport;
pub(crate) mod user_agent;
pub mod version;

// Re-export commonly used types
pub use config::{ConfigError, load_servers_file, parse_servers_json, resolve_default_config_path};
pub use orchestrator::{OrchestratorOptions, RequestError, RequestOrchestrator};
pub use server::registry::{
    RegistryError, RegistryEvent, RegistryListener, ServerConfigSource, ServerRegistry,
};
pub use server::{BasicAuth, CustomHeader, ServerConfig, ServerId};
pub use session::{LoginOutcome, classify_login};
pub use transport::{ApiResponse, TransportClient, TransportError};
pub use version::{ApiVersion, DEFAULT_VERSION_TTL, Version, parse_version};
