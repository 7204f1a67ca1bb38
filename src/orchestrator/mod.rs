//! Authenticated request execution across many servers.
//!
//! [`RequestOrchestrator`] is the entry point business code uses: it takes a
//! server id and a closure that performs one HTTP call, and runs the closure
//! inside the ensure-login, call, retry-once protocol.
//!
//! # Overview
//!
//! - The first request to a server logs in under that server's login lock;
//!   concurrent first requests wait for that single login.
//! - Once logged in, requests run in parallel without touching the lock.
//! - A 403 mid-session triggers one re-login and one retry, never more.
//! - Every request first makes sure the server's cached version is fresh.
//! - Registry edits and removals drop the server's whole session.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qbremote_core::{RequestOrchestrator, ServerConfig, ServerId, ServerRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ServerRegistry::new());
//! registry.add(ServerConfig::new(ServerId::new(1), "http://nas:8080"))?;
//! let orchestrator = RequestOrchestrator::attach(&registry, Default::default());
//!
//! let body = orchestrator
//!     .execute(ServerId::new(1), |client| async move {
//!         client.post_form("api/v2/torrents/pause", &[("hashes", "all")]).await
//!     })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

mod error;
mod options;
mod request;

pub use error::RequestError;
pub use options::OrchestratorOptions;
pub use request::RequestOrchestrator;

// Note: no module-local Result alias. Use `Result<T, RequestError>` explicitly.
