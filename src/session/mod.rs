//! Per-server session state.
//!
//! A [`ServerSession`] bundles everything one server needs: its transport
//! client (and with it the cookie jar holding the session), the `logged_in`
//! flag, the login lock, and the cached version entry. The bundle is created
//! as a unit on first use and dropped as a unit on invalidation, so no part
//! of it can outlive a configuration change.
//!
//! # Locking
//!
//! - The login lock serializes login attempts for one server. It is held only
//!   across the login exchange, never across ordinary requests.
//! - The version lock serializes version fetches and is independent of the
//!   login lock, so a slow version fetch never blocks a login and vice versa.
//! - `logged_in` may be read without the login lock, but is only written
//!   while it is held (enforced by [`ServerSession::login`] taking the guard).

mod login;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, trace, warn};

pub use login::{LOGIN_FAILURE_BODY, LOGIN_SUCCESS_BODY, LoginOutcome, classify_login};

use crate::server::{ServerConfig, ServerId};
use crate::transport::{TransportClient, TransportError, VERSION_ENDPOINT};
use crate::version::{Version, VersionEntry, parse_version};
use login::{Credentials, perform_login};

/// All state kept for one server between requests.
#[derive(Debug)]
pub struct ServerSession {
    server: ServerId,
    client: Arc<TransportClient>,
    credentials: Option<Credentials>,
    logged_in: AtomicBool,
    login_generation: AtomicU64,
    login_lock: Mutex<()>,
    version: Mutex<Option<VersionEntry>>,
}

impl ServerSession {
    /// Builds a fresh, logged-out session from a configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport client cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let client = TransportClient::for_server(config)?;
        Ok(Self {
            server: config.id,
            client: Arc::new(client),
            credentials: Credentials::from_config(config),
            logged_in: AtomicBool::new(false),
            login_generation: AtomicU64::new(0),
            login_lock: Mutex::new(()),
            version: Mutex::new(None),
        })
    }

    /// Returns the server this session belongs to.
    #[must_use]
    pub fn server(&self) -> ServerId {
        self.server
    }

    /// Returns a shared handle to the server's transport client.
    #[must_use]
    pub fn client(&self) -> Arc<TransportClient> {
        Arc::clone(&self.client)
    }

    /// Returns `true` once a login has succeeded and not been invalidated.
    ///
    /// This is an unguarded read; callers that act on it re-check under the
    /// login lock.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    /// Returns the number of successful logins on this session.
    ///
    /// A caller that saw a 403 compares this against the value it read
    /// before sending to tell whether another task already renewed the
    /// session in the meantime.
    #[must_use]
    pub fn login_generation(&self) -> u64 {
        self.login_generation.load(Ordering::SeqCst)
    }

    /// Returns `true` when the server has login credentials configured.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        self.credentials.is_some()
    }

    /// Waits for the login lock.
    pub async fn lock_login(&self) -> LoginGuard<'_> {
        let guard = self.login_lock.lock().await;
        trace!(server = %self.server, "login lock acquired");
        LoginGuard {
            server: self.server,
            guard: Some(guard),
        }
    }

    /// Runs one login exchange and records the outcome in `logged_in`.
    ///
    /// The guard must be this session's held login lock. Any outcome other
    /// than success (including a transport failure) leaves the session
    /// logged out.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the exchange fails at the network level.
    #[instrument(level = "debug", skip_all, fields(server = %self.server))]
    pub async fn login(&self, guard: &LoginGuard<'_>) -> Result<LoginOutcome, TransportError> {
        debug_assert!(guard.is_held(), "login requires the held login lock");
        debug_assert_eq!(guard.server, self.server, "login guard of another server");

        let result = perform_login(&self.client, self.credentials.as_ref()).await;
        let success = result.as_ref().is_ok_and(LoginOutcome::is_success);
        if success {
            self.login_generation.fetch_add(1, Ordering::SeqCst);
        }
        self.logged_in.store(success, Ordering::SeqCst);

        match &result {
            Ok(LoginOutcome::Success) => debug!("login succeeded"),
            Ok(outcome) => warn!(?outcome, "login rejected"),
            Err(error) => warn!(error = %error, "login failed"),
        }
        result
    }

    /// Clears `logged_in` so the next request takes the first-login path.
    pub fn mark_logged_out(&self, guard: &LoginGuard<'_>) {
        debug_assert!(guard.is_held(), "logout requires the held login lock");
        self.logged_in.store(false, Ordering::SeqCst);
    }

    /// Returns the cached version entry without fetching.
    pub async fn cached_version(&self) -> Option<VersionEntry> {
        *self.version.lock().await
    }

    /// Returns the cached version, fetching it first if absent or older than `ttl`.
    ///
    /// The version lock is held across the fetch so concurrent callers wait
    /// for one fetch instead of issuing their own. Fetch failures and
    /// malformed text store [`Version::Invalid`]; they never surface as
    /// errors. A 403 means the session is gone, not that the version is
    /// unknown: it yields [`Version::Invalid`] without touching the cache, so
    /// the next call after a re-login fetches again.
    #[instrument(level = "debug", skip_all, fields(server = %self.server))]
    pub async fn ensure_version_fresh(&self, ttl: Duration) -> Version {
        let mut slot = self.version.lock().await;
        if let Some(entry) = slot.as_ref().filter(|entry| !entry.is_stale(ttl)) {
            trace!(version = %entry.version(), "version cache hit");
            return entry.version();
        }

        match self.fetch_version().await {
            Some(version) => {
                *slot = Some(VersionEntry::fetched_now(version));
                version
            }
            None => Version::Invalid,
        }
    }

    /// Fetches and parses the version text. `None` when the session was rejected.
    async fn fetch_version(&self) -> Option<Version> {
        let version = match self.client.get(VERSION_ENDPOINT, &[]).await {
            Ok(response) if response.is_auth_failure() => {
                debug!("version fetch rejected by expired session, not caching");
                return None;
            }
            Ok(response) if response.is_success() => {
                let raw = response.body.as_deref().unwrap_or_default();
                let version = parse_version(raw);
                if version == Version::Invalid {
                    warn!(raw, "unparseable version text");
                } else {
                    debug!(%version, "fetched server version");
                }
                version
            }
            Ok(response) => {
                warn!(status = response.status, "version fetch rejected");
                Version::Invalid
            }
            Err(error) => {
                warn!(error = %error, "version fetch failed");
                Version::Invalid
            }
        };
        Some(version)
    }
}

/// Holder of a server's login lock.
///
/// Dropping the guard releases the lock, so a task cancelled while holding it
/// (for example by a timeout around `execute`) cannot leave the server locked.
/// [`release`](Self::release) may be called any number of times.
#[derive(Debug)]
pub struct LoginGuard<'a> {
    server: ServerId,
    guard: Option<MutexGuard<'a, ()>>,
}

impl LoginGuard<'_> {
    /// Returns `true` while the lock is still held by this guard.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Releases the lock if still held. Further calls do nothing.
    pub fn release(&mut self) {
        if self.guard.take().is_some() {
            trace!(server = %self.server, "login lock released");
        }
    }
}

impl Drop for LoginGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
