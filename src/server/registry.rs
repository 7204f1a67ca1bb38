//! In-memory server registry with synchronous change notification.
//!
//! The registry is the source of truth for [`ServerConfig`] snapshots. Every
//! mutation notifies subscribed [`RegistryListener`]s while the registry's
//! write lock is still held, so no reader can observe an edited configuration
//! before listeners have dropped the resources built from the old one.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use thiserror::Error;
use tracing::{debug, instrument};

use super::{ServerConfig, ServerId};
use crate::config::ConfigError;

/// Read access to server configuration snapshots.
///
/// Implemented by [`ServerRegistry`]; embedders with their own settings store
/// can implement it directly and call
/// [`RequestOrchestrator::invalidate`](crate::RequestOrchestrator::invalidate) on changes.
pub trait ServerConfigSource: Send + Sync {
    /// Returns a full snapshot for `id`, or `None` when it is not configured.
    fn server_config(&self, id: ServerId) -> Option<ServerConfig>;
}

/// A change applied to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A new server was added.
    Added(ServerId),
    /// An existing server's configuration was replaced.
    Edited(ServerId),
    /// A server was removed.
    Removed(ServerId),
}

impl RegistryEvent {
    /// Returns the server the event concerns.
    #[must_use]
    pub fn server(self) -> ServerId {
        match self {
            Self::Added(id) | Self::Edited(id) | Self::Removed(id) => id,
        }
    }
}

/// Receives registry changes.
///
/// Called with the registry write lock held: implementations must not call
/// back into the registry and must not block.
pub trait RegistryListener: Send + Sync {
    /// Handles one change.
    fn on_registry_event(&self, event: RegistryEvent);
}

/// Errors from registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `add` was called with an id that is already configured.
    #[error("server {0} is already configured")]
    AlreadyExists(ServerId),

    /// `edit` or `remove` was called with an id that is not configured.
    #[error("server {0} is not configured")]
    NotFound(ServerId),

    /// The configuration failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Thread-safe store of server configurations.
#[derive(Default)]
pub struct ServerRegistry {
    servers: RwLock<BTreeMap<ServerId, ServerConfig>>,
    listeners: Mutex<Vec<Weak<dyn RegistryListener>>>,
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRegistry")
            .field("servers", &self.len())
            .finish_non_exhaustive()
    }
}

impl ServerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with `configs`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on the first invalid or duplicate entry.
    pub fn from_configs(
        configs: impl IntoIterator<Item = ServerConfig>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for config in configs {
            registry.add(config)?;
        }
        Ok(registry)
    }

    /// Subscribes `listener` to future changes.
    ///
    /// Only a weak reference is kept; dropped listeners are pruned on the
    /// next notification.
    pub fn subscribe(&self, listener: &Arc<dyn RegistryListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(listener));
    }

    /// Adds a new server. No resources are created until first use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyExists`] for a duplicate id and
    /// [`RegistryError::Invalid`] when validation fails.
    #[instrument(skip(self, config), fields(server = %config.id))]
    pub fn add(&self, config: ServerConfig) -> Result<(), RegistryError> {
        config.validate()?;
        let id = config.id;
        let mut servers = self.servers.write().unwrap_or_else(PoisonError::into_inner);
        if servers.contains_key(&id) {
            return Err(RegistryError::AlreadyExists(id));
        }
        servers.insert(id, config);
        self.notify(RegistryEvent::Added(id));
        debug!("server added");
        Ok(())
    }

    /// Replaces an existing server's configuration.
    ///
    /// Listeners are notified before the write lock is released.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown id and
    /// [`RegistryError::Invalid`] when validation fails.
    #[instrument(skip(self, config), fields(server = %config.id))]
    pub fn edit(&self, config: ServerConfig) -> Result<(), RegistryError> {
        config.validate()?;
        let id = config.id;
        let mut servers = self.servers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = servers.get_mut(&id) else {
            return Err(RegistryError::NotFound(id));
        };
        *slot = config;
        self.notify(RegistryEvent::Edited(id));
        debug!("server edited");
        Ok(())
    }

    /// Removes a server and returns its last configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown id.
    #[instrument(skip(self), fields(server = %id))]
    pub fn remove(&self, id: ServerId) -> Result<ServerConfig, RegistryError> {
        let mut servers = self.servers.write().unwrap_or_else(PoisonError::into_inner);
        let removed = servers.remove(&id).ok_or(RegistryError::NotFound(id))?;
        self.notify(RegistryEvent::Removed(id));
        debug!("server removed");
        Ok(removed)
    }

    /// Returns a snapshot of the server, if configured.
    #[must_use]
    pub fn get(&self, id: ServerId) -> Option<ServerConfig> {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Returns snapshots of every server ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<ServerConfig> {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Returns every configured id in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ServerId> {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Returns the number of configured servers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no server is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, event: RegistryEvent) {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|weak| match weak.upgrade() {
            Some(listener) => {
                listener.on_registry_event(event);
                true
            }
            None => false,
        });
    }
}

impl ServerConfigSource for ServerRegistry {
    fn server_config(&self, id: ServerId) -> Option<ServerConfig> {
        self.get(id)
    }
}
