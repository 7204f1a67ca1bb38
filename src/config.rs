//! Loading the server list from disk.
//!
//! The server file is a JSON array of [`ServerConfig`] objects:
//!
//! ```json
//! [
//!   { "id": 1, "name": "NAS", "base_url": "http://nas:8080",
//!     "username": "admin", "password": "adminadmin" },
//!   { "id": 2, "base_url": "https://seedbox.example.com/qbit/",
//!     "basic_auth": { "username": "proxy", "password": "secret" },
//!     "custom_headers": [{ "name": "X-Api-Key", "value": "abc" }],
//!     "timeout_secs": 30 }
//! ]
//! ```

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::server::{ServerConfig, ServerId};

/// Directory name under the user config directory.
const CONFIG_DIR_NAME: &str = "qbremote";

/// File name of the server list.
const SERVERS_FILE_NAME: &str = "servers.json";

/// Errors from reading or validating server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The server file could not be read.
    #[error("cannot read server file {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server file is not valid JSON or does not match the schema.
    #[error("cannot parse server list: {source}")]
    Parse {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Two entries share one id.
    #[error("server id {server} is defined more than once")]
    DuplicateId {
        /// The duplicated id.
        server: ServerId,
    },

    /// The base URL does not parse.
    #[error("server {server}: invalid base URL '{url}'")]
    InvalidBaseUrl {
        /// Offending server.
        server: ServerId,
        /// The rejected URL.
        url: String,
    },

    /// The base URL uses a scheme other than http or https.
    #[error("server {server}: unsupported URL scheme '{scheme}', expected http or https")]
    UnsupportedScheme {
        /// Offending server.
        server: ServerId,
        /// The rejected scheme.
        scheme: String,
    },

    /// The timeout is outside the accepted range.
    #[error("server {server}: invalid timeout_secs {value}, expected range 1..=3600")]
    InvalidTimeout {
        /// Offending server.
        server: ServerId,
        /// The rejected value.
        value: u64,
    },

    /// Basic auth is configured without a user name.
    #[error("server {server}: basic_auth requires a username")]
    BasicAuthWithoutUsername {
        /// Offending server.
        server: ServerId,
    },
}

/// Resolves the default server file path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/qbremote/servers.json`
/// 2. `$HOME/.config/qbremote/servers.json`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(SERVERS_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(SERVERS_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Reads and validates a server file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
/// errors of [`parse_servers_json`].
pub fn load_servers_file(path: &Path) -> Result<Vec<ServerConfig>, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let servers = parse_servers_json(&raw)?;
    debug!(path = %path.display(), servers = servers.len(), "loaded server file");
    Ok(servers)
}

/// Parses and validates a JSON server list.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed JSON,
/// [`ConfigError::DuplicateId`] for repeated ids, and the validation errors
/// of [`ServerConfig::validate`].
pub fn parse_servers_json(raw: &str) -> Result<Vec<ServerConfig>, ConfigError> {
    let servers: Vec<ServerConfig> =
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse { source })?;

    let mut seen = HashSet::with_capacity(servers.len());
    for server in &servers {
        if !seen.insert(server.id) {
            return Err(ConfigError::DuplicateId { server: server.id });
        }
        server.validate()?;
    }
    Ok(servers)
}
