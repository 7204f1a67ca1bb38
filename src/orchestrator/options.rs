//! Tunables for the request orchestrator.

use std::time::Duration;

use crate::version::DEFAULT_VERSION_TTL;

/// Orchestrator settings shared by all servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// How long a fetched version stays fresh before the next request refetches it.
    pub version_ttl: Duration,
}

impl OrchestratorOptions {
    /// Overrides the version freshness window.
    #[must_use]
    pub fn with_version_ttl(mut self, version_ttl: Duration) -> Self {
        self.version_ttl = version_ttl;
        self
    }
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            version_ttl: DEFAULT_VERSION_TTL,
        }
    }
}
