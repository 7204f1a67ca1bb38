//! qBittorrent application version parsing and caching.
//!
//! The version endpoint returns plain text such as `v4.6.3`. It is parsed
//! into a [`Version`], which is either a valid `major.minor.patch` triple or
//! an explicit [`Version::Invalid`] marker. Parsing never fails loudly: the
//! version is informational and must never gate a request.
//!
//! # Example
//!
//! ```
//! use qbremote_core::version::{ApiVersion, Version, parse_version};
//!
//! assert_eq!(parse_version("4.5.2"), Version::Valid(ApiVersion::new(4, 5, 2)));
//! assert_eq!(parse_version("v4.5"), Version::Valid(ApiVersion::new(4, 5, 0)));
//! assert_eq!(parse_version("abc"), Version::Invalid);
//! ```

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Freshness window of a cached version entry (1 hour).
pub const DEFAULT_VERSION_TTL: Duration = Duration::from_secs(3600);

/// A parsed `major.minor.patch` application version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component (0 when the server reported only two components).
    pub patch: u32,
}

impl ApiVersion {
    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A server version, or an explicit marker that it could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// The server reported a parseable version.
    Valid(ApiVersion),
    /// The version text was malformed or could not be fetched.
    Invalid,
}

impl Version {
    /// Returns the parsed triple, if valid.
    #[must_use]
    pub fn as_valid(self) -> Option<ApiVersion> {
        match self {
            Self::Valid(version) => Some(version),
            Self::Invalid => None,
        }
    }

    /// Returns `true` when the version is valid and at least `major.minor.patch`.
    ///
    /// An invalid version never satisfies a minimum, so feature gates fall back
    /// to the conservative path.
    #[must_use]
    pub fn is_at_least(self, major: u32, minor: u32, patch: u32) -> bool {
        self.as_valid()
            .is_some_and(|version| version >= ApiVersion::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(version) => version.fmt(f),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

/// Parses version endpoint text as `[v]major.minor[.patch]`.
///
/// Surrounding whitespace and a single leading `v`/`V` are ignored. Anything
/// else (wrong arity, empty or non-numeric components, signs) yields
/// [`Version::Invalid`].
#[must_use]
pub fn parse_version(raw: &str) -> Version {
    let trimmed = raw.trim();
    let text = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let components: Option<Vec<u32>> = text.split('.').map(parse_component).collect();
    match components.as_deref() {
        Some(&[major, minor]) => Version::Valid(ApiVersion::new(major, minor, 0)),
        Some(&[major, minor, patch]) => Version::Valid(ApiVersion::new(major, minor, patch)),
        _ => Version::Invalid,
    }
}

fn parse_component(component: &str) -> Option<u32> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    component.parse().ok()
}

/// Cached version of one server and when it was fetched.
#[derive(Debug, Clone, Copy)]
pub struct VersionEntry {
    fetched_at: Instant,
    version: Version,
}

impl VersionEntry {
    /// Records `version` as fetched now.
    #[must_use]
    pub fn fetched_now(version: Version) -> Self {
        Self {
            fetched_at: Instant::now(),
            version,
        }
    }

    /// Returns the cached version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns when the entry was fetched.
    #[must_use]
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Returns `true` once `ttl` or more has elapsed since the fetch.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() >= ttl
    }
}
