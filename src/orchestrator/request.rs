//! The ensure-login, call, retry-once protocol.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::error::RequestError;
use super::options::OrchestratorOptions;
use crate::server::ServerId;
use crate::server::registry::{
    RegistryEvent, RegistryListener, ServerConfigSource, ServerRegistry,
};
use crate::session::{LoginOutcome, ServerSession};
use crate::transport::{ApiResponse, LOGOUT_ENDPOINT, TransportClient, TransportError};
use crate::version::Version;

/// Runs requests against registered servers with lazy login and retry-once.
///
/// Designed to be wrapped in `Arc` and shared across Tokio tasks. Per-server
/// state lives in a `DashMap` of `Arc<ServerSession>`; the `Arc` is cloned out
/// so no map shard lock is ever held across an `.await`.
///
/// # Thread Safety
///
/// Servers are fully independent: a login in progress on one server never
/// delays requests to another.
pub struct RequestOrchestrator {
    registry: Arc<dyn ServerConfigSource>,
    sessions: DashMap<ServerId, Arc<ServerSession>>,
    /// Bumped on every invalidation. A session built from a configuration
    /// read before the bump is discarded instead of inserted.
    epoch: AtomicU64,
    options: OrchestratorOptions,
}

impl std::fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("sessions", &self.sessions.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RequestOrchestrator {
    /// Creates an orchestrator reading configuration from `registry`.
    ///
    /// The orchestrator does not hear about registry changes unless it is
    /// subscribed; prefer [`attach`](Self::attach) for a [`ServerRegistry`].
    #[must_use]
    pub fn new(registry: Arc<dyn ServerConfigSource>) -> Self {
        Self::with_options(registry, OrchestratorOptions::default())
    }

    /// Creates an orchestrator with explicit options.
    #[must_use]
    pub fn with_options(
        registry: Arc<dyn ServerConfigSource>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            sessions: DashMap::new(),
            epoch: AtomicU64::new(0),
            options,
        }
    }

    /// Creates an orchestrator over `registry` and subscribes it to registry changes.
    #[must_use]
    pub fn attach(registry: &Arc<ServerRegistry>, options: OrchestratorOptions) -> Arc<Self> {
        let source: Arc<dyn ServerConfigSource> = Arc::<ServerRegistry>::clone(registry);
        let orchestrator = Arc::new(Self::with_options(source, options));
        let listener: Arc<dyn RegistryListener> = Arc::<Self>::clone(&orchestrator);
        registry.subscribe(&listener);
        orchestrator
    }

    /// Returns the options in effect.
    #[must_use]
    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    /// Runs `request` against `server` and returns the response body.
    ///
    /// `request` may be invoked twice: once normally and once more after a
    /// re-login if the first call answered 403 on an established session.
    ///
    /// # Errors
    ///
    /// - [`RequestError::UnknownServer`] if the id is not registered
    /// - [`RequestError::InvalidCredentials`], [`RequestError::Banned`] or
    ///   [`RequestError::UnknownLoginResponse`] if a login was needed and failed
    /// - [`RequestError::Network`] if the server could not be reached
    /// - [`RequestError::Api`] for any final status other than 200 with a body
    ///
    /// Cancelling the returned future at any point releases the server's
    /// login lock.
    #[instrument(skip(self, request), fields(server = %server))]
    pub async fn execute<F, Fut>(
        &self,
        server: ServerId,
        request: F,
    ) -> Result<String, RequestError>
    where
        F: Fn(Arc<TransportClient>) -> Fut,
        Fut: Future<Output = Result<ApiResponse, TransportError>>,
    {
        let session = self.session_for(server)?;
        let fresh_login = Self::ensure_session(&session).await?;

        let generation = session.login_generation();
        let response = self.send(&session, &request).await?;
        if fresh_login || !response.is_auth_failure() {
            return into_body(response);
        }

        info!("session expired, logging in again");
        Self::renew_session(&session, generation).await?;
        let retried = self.send(&session, &request).await?;
        if retried.is_auth_failure() {
            warn!("request rejected again after re-login");
        }
        into_body(retried)
    }

    /// Like [`execute`](Self::execute), decoding the body as JSON.
    ///
    /// # Errors
    ///
    /// The errors of [`execute`](Self::execute), plus [`RequestError::Decode`]
    /// when the body does not match `T`.
    pub async fn execute_json<T, F, Fut>(
        &self,
        server: ServerId,
        request: F,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        F: Fn(Arc<TransportClient>) -> Fut,
        Fut: Future<Output = Result<ApiResponse, TransportError>>,
    {
        let body = self.execute(server, request).await?;
        serde_json::from_str(&body).map_err(|source| RequestError::Decode { source })
    }

    /// Logs in to `server` now, whether or not a session already exists.
    ///
    /// # Errors
    ///
    /// Returns the login failure variants of [`RequestError`], or
    /// [`RequestError::UnknownServer`] / [`RequestError::Network`].
    #[instrument(skip(self), fields(server = %server))]
    pub async fn login(&self, server: ServerId) -> Result<(), RequestError> {
        let session = self.session_for(server)?;
        let guard = session.lock_login().await;
        let outcome = session.login(&guard).await;
        drop(guard);
        check_login(outcome)?;
        info!("logged in");
        Ok(())
    }

    /// Logs in to `server` only if no session has been established yet.
    ///
    /// # Errors
    ///
    /// As for [`login`](Self::login).
    pub async fn ensure_logged_in(&self, server: ServerId) -> Result<(), RequestError> {
        let session = self.session_for(server)?;
        Self::ensure_session(&session).await.map(|_| ())
    }

    /// Logs out of `server` and drops all of its cached state.
    ///
    /// The logout call is only made when a logged-in session exists. The
    /// server's resources are torn down whatever the outcome, so the next
    /// request starts from a fresh login.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Network`] or [`RequestError::Api`] if the
    /// logout call itself failed.
    #[instrument(skip(self), fields(server = %server))]
    pub async fn logout(&self, server: ServerId) -> Result<(), RequestError> {
        let Some(session) = self.existing_session(server) else {
            debug!("no session to log out of");
            return Ok(());
        };

        let guard = session.lock_login().await;
        let result = if session.is_logged_in() && session.requires_login() {
            session.mark_logged_out(&guard);
            match session.client().post_form(LOGOUT_ENDPOINT, &[]).await {
                Ok(response) if response.status == 200 => Ok(()),
                Ok(response) => Err(RequestError::Api {
                    status: response.status,
                }),
                Err(error) => Err(RequestError::Network(error)),
            }
        } else {
            Ok(())
        };
        drop(guard);

        self.invalidate(server);
        if result.is_ok() {
            info!("logged out");
        }
        result
    }

    /// Logs in if needed, then makes sure `server`'s cached version is fresh
    /// and returns it.
    ///
    /// Never fails because of the version endpoint itself; an unreachable or
    /// malformed endpoint yields [`Version::Invalid`].
    ///
    /// # Errors
    ///
    /// As for [`ensure_logged_in`](Self::ensure_logged_in).
    #[instrument(skip(self), fields(server = %server))]
    pub async fn ensure_version_fresh(&self, server: ServerId) -> Result<Version, RequestError> {
        let session = self.session_for(server)?;
        Self::ensure_session(&session).await?;
        Ok(session.ensure_version_fresh(self.options.version_ttl).await)
    }

    /// Returns the cached version of `server` without fetching.
    ///
    /// `None` when the server has no session or no fetch has happened yet.
    pub async fn cached_version(&self, server: ServerId) -> Option<Version> {
        let session = self.existing_session(server)?;
        session.cached_version().await.map(|entry| entry.version())
    }

    /// Drops every resource held for `server`.
    ///
    /// Requests already running keep their handle to the old session; any
    /// request started afterwards builds a fresh one from the registry.
    /// Returns `true` if a session existed.
    pub fn invalidate(&self, server: ServerId) -> bool {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let removed = self.sessions.remove(&server).is_some();
        debug!(server = %server, removed, "session invalidated");
        removed
    }

    /// Returns the ids of servers that currently hold a session, sorted.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<ServerId> {
        let mut ids: Vec<ServerId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn existing_session(&self, server: ServerId) -> Option<Arc<ServerSession>> {
        self.sessions.get(&server).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the server's session, building it from the registry on first use.
    fn session_for(&self, server: ServerId) -> Result<Arc<ServerSession>, RequestError> {
        loop {
            if let Some(session) = self.existing_session(server) {
                return Ok(session);
            }

            let epoch = self.epoch.load(Ordering::SeqCst);
            let config = self
                .registry
                .server_config(server)
                .ok_or(RequestError::UnknownServer { server })?;
            let session = Arc::new(ServerSession::new(&config)?);

            match self.sessions.entry(server) {
                Entry::Occupied(existing) => return Ok(Arc::clone(existing.get())),
                Entry::Vacant(slot) => {
                    if self.epoch.load(Ordering::SeqCst) != epoch {
                        debug!(server = %server, "configuration changed during build, retrying");
                        continue;
                    }
                    slot.insert(Arc::clone(&session));
                    debug!(server = %server, "session created");
                    return Ok(session);
                }
            }
        }
    }

    /// Logs in under the login lock unless already logged in.
    ///
    /// Returns `true` when this call performed the login.
    async fn ensure_session(session: &ServerSession) -> Result<bool, RequestError> {
        let mut guard = session.lock_login().await;
        if session.is_logged_in() {
            guard.release();
            return Ok(false);
        }

        let outcome = session.login(&guard).await;
        guard.release();
        check_login(outcome)?;
        info!(server = %session.server(), "logged in");
        Ok(true)
    }

    /// Re-logs in after a 403, unless another task already did since `seen_generation`.
    async fn renew_session(
        session: &ServerSession,
        seen_generation: u64,
    ) -> Result<(), RequestError> {
        let guard = session.lock_login().await;
        if session.is_logged_in() && session.login_generation() != seen_generation {
            debug!("session already renewed by another request");
            return Ok(());
        }

        let outcome = session.login(&guard).await;
        drop(guard);
        check_login(outcome)
    }

    async fn send<F, Fut>(
        &self,
        session: &ServerSession,
        request: &F,
    ) -> Result<ApiResponse, RequestError>
    where
        F: Fn(Arc<TransportClient>) -> Fut,
        Fut: Future<Output = Result<ApiResponse, TransportError>>,
    {
        session.ensure_version_fresh(self.options.version_ttl).await;
        let response = request(session.client()).await?;
        debug!(status = response.status, "request completed");
        Ok(response)
    }
}

impl RegistryListener for RequestOrchestrator {
    fn on_registry_event(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::Added(server) => debug!(server = %server, "server added"),
            RegistryEvent::Edited(server) | RegistryEvent::Removed(server) => {
                self.invalidate(server);
            }
        }
    }
}

fn check_login(outcome: Result<LoginOutcome, TransportError>) -> Result<(), RequestError> {
    match RequestError::from_login(outcome?) {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn into_body(response: ApiResponse) -> Result<String, RequestError> {
    match response {
        ApiResponse {
            status: 200,
            body: Some(body),
        } => Ok(body),
        ApiResponse { status, .. } => Err(RequestError::Api { status }),
    }
}
