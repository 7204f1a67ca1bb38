//! HTTP client wrapper bound to one server.
//!
//! This module provides [`TransportClient`], which pins a reqwest client to a
//! server's base URL, timeout, headers and private cookie jar.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument, trace};
use url::Url;

use super::constants::SESSION_COOKIE;
use super::error::TransportError;
use super::response::ApiResponse;
use crate::server::{BasicAuth, ServerConfig};
use crate::user_agent;

/// HTTP client for one qBittorrent server.
///
/// Built once per server from a [`ServerConfig`] snapshot and reused for every
/// request to that server, taking advantage of connection pooling. The cookie
/// jar is private to the client: the `SID` cookie a login sets here is never
/// sent to any other server.
#[derive(Debug)]
pub struct TransportClient {
    client: Client,
    base_url: Url,
    basic_auth: Option<BasicAuth>,
    jar: Arc<Jar>,
}

impl TransportClient {
    /// Builds a client from a configuration snapshot.
    ///
    /// Every request carries the configured custom headers, a `Referer`
    /// matching the base URL (required by the Web UI's CSRF check), and basic
    /// auth when configured.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] for an unusable base URL,
    /// [`TransportError::InvalidHeader`] for a malformed custom header, and
    /// [`TransportError::Build`] when reqwest rejects the configuration.
    #[instrument(level = "debug", skip(config), fields(server = %config.id))]
    pub fn for_server(config: &ServerConfig) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let headers = default_headers(config, &base_url)?;
        let jar = Arc::new(Jar::default());

        let client = Client::builder()
            .connect_timeout(config.timeout())
            .timeout(config.timeout())
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(TransportError::build)?;

        debug!(base_url = %base_url, timeout_secs = config.timeout_secs, "built transport client");
        Ok(Self {
            client,
            base_url,
            basic_auth: config.basic_auth.clone(),
            jar,
        })
    }

    /// Returns the normalized base URL (always ending in `/`).
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path relative to the base URL.
    ///
    /// Leading slashes are ignored so a reverse-proxy path prefix on the base
    /// URL is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| TransportError::invalid_url(format!("{}{path}", self.base_url)))
    }

    /// Sends a GET with query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on URL, network or timeout failures. HTTP
    /// error statuses are returned as an [`ApiResponse`], not as errors.
    #[instrument(level = "debug", skip(self, query), fields(path = %path))]
    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(path)?;
        let request = self.client.get(url.clone()).query(query);
        self.send(request, &url).await
    }

    /// Sends a POST with a URL-encoded form body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on URL, network or timeout failures. HTTP
    /// error statuses are returned as an [`ApiResponse`], not as errors.
    #[instrument(level = "debug", skip(self, form), fields(path = %path))]
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url.clone()).form(form);
        self.send(request, &url).await
    }

    /// Returns `true` when the jar holds a session cookie for this server.
    #[must_use]
    pub fn has_session_cookie(&self) -> bool {
        let prefix = format!("{SESSION_COOKIE}=");
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| {
                value
                    .to_str()
                    .ok()
                    .map(|cookies| cookies.split(';').any(|c| c.trim().starts_with(&prefix)))
            })
            .unwrap_or(false)
    }

    async fn send(
        &self,
        mut request: RequestBuilder,
        url: &Url,
    ) -> Result<ApiResponse, TransportError> {
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, auth.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e))?;

        trace!(status, bytes = body.len(), "received response");
        Ok(ApiResponse::new(status, Some(body)))
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, TransportError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|_| TransportError::invalid_url(raw))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::invalid_url(raw));
    }
    Ok(url)
}

fn default_headers(config: &ServerConfig, base_url: &Url) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    let referer = HeaderValue::from_str(base_url.as_str())
        .map_err(|_| TransportError::invalid_url(base_url.as_str()))?;
    headers.insert(REFERER, referer);

    for header in &config.custom_headers {
        let name = HeaderName::from_bytes(header.name.trim().as_bytes())
            .map_err(|_| TransportError::invalid_header(&header.name))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|_| TransportError::invalid_header(&header.name))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
