//! Constants for the transport module (timeouts, Web API endpoints).

/// Default connect and request timeout (10 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Login endpoint, relative to the server base URL.
pub const LOGIN_ENDPOINT: &str = "api/v2/auth/login";

/// Logout endpoint, relative to the server base URL.
pub const LOGOUT_ENDPOINT: &str = "api/v2/auth/logout";

/// Application version endpoint, relative to the server base URL.
pub const VERSION_ENDPOINT: &str = "api/v2/app/version";

/// Name of the session cookie set by a successful login.
pub const SESSION_COOKIE: &str = "SID";
