//! User-Agent string for Web API traffic.
//!
//! Single source for the UA format so every server sees the same
//! identification.

/// Client label placed after the version in the User-Agent comment.
const CLIENT_LABEL: &str = "webui-client";

/// Default User-Agent for Web API requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("qbremote/{version} ({CLIENT_LABEL})")
}
