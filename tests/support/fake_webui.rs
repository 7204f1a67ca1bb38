//! A stateful fake of the qBittorrent Web UI on top of wiremock.
//!
//! Login with the right credentials issues a fresh `SID` cookie; every other
//! endpoint answers 403 unless the request carries the current `SID`.
//! [`FakeWebUi::expire_session`] invalidates the cookie server-side, which is
//! how a real server behaves after its session timeout.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::socket_guard::start_mock_server_or_skip;
use super::{PASSWORD, USERNAME};

#[derive(Debug)]
struct State {
    username: String,
    password: String,
    valid_sid: Mutex<Option<String>>,
    banned: AtomicBool,
    login_delay: Mutex<Duration>,
    api_delay: Mutex<Duration>,
    version_text: Mutex<String>,
    api_body: Mutex<String>,
    logins: AtomicUsize,
    logouts: AtomicUsize,
    version_calls: AtomicUsize,
    api_calls: AtomicUsize,
}

fn locked<T: Clone>(mutex: &Mutex<T>) -> T {
    mutex.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

fn set<T>(mutex: &Mutex<T>, value: T) {
    *mutex.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

impl State {
    fn is_authenticated(&self, request: &Request) -> bool {
        let Some(sid) = locked(&self.valid_sid) else {
            return false;
        };
        let expected = format!("SID={sid}");
        request
            .headers
            .get("cookie")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookies| cookies.split(';').any(|c| c.trim() == expected))
    }
}

struct LoginResponder(Arc<State>);

impl Respond for LoginResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let state = &self.0;
        let delay = locked(&state.login_delay);
        if state.banned.load(Ordering::SeqCst) {
            return ResponseTemplate::new(403)
                .set_body_string("Your IP address has been banned")
                .set_delay(delay);
        }

        let mut username = None;
        let mut password = None;
        for (key, value) in url::form_urlencoded::parse(&request.body) {
            match key.as_ref() {
                "username" => username = Some(value.into_owned()),
                "password" => password = Some(value.into_owned()),
                _ => {}
            }
        }

        if username.as_deref() != Some(state.username.as_str())
            || password.as_deref() != Some(state.password.as_str())
        {
            return ResponseTemplate::new(200)
                .set_body_string("Fails.")
                .set_delay(delay);
        }

        let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;
        let sid = format!("sid{n}");
        set(&state.valid_sid, Some(sid.clone()));
        ResponseTemplate::new(200)
            .insert_header("set-cookie", format!("SID={sid}; HttpOnly; path=/").as_str())
            .set_body_string("Ok.")
            .set_delay(delay)
    }
}

struct LogoutResponder(Arc<State>);

impl Respond for LogoutResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.0.logouts.fetch_add(1, Ordering::SeqCst);
        set(&self.0.valid_sid, None);
        ResponseTemplate::new(200)
    }
}

struct VersionResponder(Arc<State>);

impl Respond for VersionResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.0.version_calls.fetch_add(1, Ordering::SeqCst);
        if !self.0.is_authenticated(request) {
            return ResponseTemplate::new(403).set_body_string("Forbidden");
        }
        ResponseTemplate::new(200).set_body_string(locked(&self.0.version_text))
    }
}

struct ApiResponder(Arc<State>);

impl Respond for ApiResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.0.api_calls.fetch_add(1, Ordering::SeqCst);
        let delay = locked(&self.0.api_delay);
        if !self.0.is_authenticated(request) {
            return ResponseTemplate::new(403)
                .set_body_string("Forbidden")
                .set_delay(delay);
        }
        ResponseTemplate::new(200)
            .set_body_string(locked(&self.0.api_body))
            .set_delay(delay)
    }
}

/// Running fake Web UI. Dropping it shuts the server down.
pub struct FakeWebUi {
    server: MockServer,
    state: Arc<State>,
}

impl FakeWebUi {
    /// Starts a fake accepting the default test credentials, or `None` when
    /// sockets are unavailable.
    pub async fn start() -> Option<Self> {
        Self::start_with_credentials(USERNAME, PASSWORD).await
    }

    pub async fn start_with_credentials(username: &str, password: &str) -> Option<Self> {
        let server = start_mock_server_or_skip().await?;
        let state = Arc::new(State {
            username: username.to_string(),
            password: password.to_string(),
            valid_sid: Mutex::new(None),
            banned: AtomicBool::new(false),
            login_delay: Mutex::new(Duration::ZERO),
            api_delay: Mutex::new(Duration::ZERO),
            version_text: Mutex::new("v4.6.3".to_string()),
            api_body: Mutex::new("[]".to_string()),
            logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
            version_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
        });

        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .respond_with(LoginResponder(Arc::clone(&state)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v2/auth/logout"))
            .respond_with(LogoutResponder(Arc::clone(&state)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/app/version"))
            .respond_with(VersionResponder(Arc::clone(&state)))
            .mount(&server)
            .await;
        Mock::given(path_regex(r"^/api/v2/(torrents|transfer|sync)/"))
            .respond_with(ApiResponder(Arc::clone(&state)))
            .mount(&server)
            .await;

        Some(Self { server, state })
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Invalidates the current session cookie server-side.
    pub fn expire_session(&self) {
        set(&self.state.valid_sid, None);
    }

    pub fn set_banned(&self, banned: bool) {
        self.state.banned.store(banned, Ordering::SeqCst);
    }

    pub fn set_login_delay(&self, delay: Duration) {
        set(&self.state.login_delay, delay);
    }

    pub fn set_api_delay(&self, delay: Duration) {
        set(&self.state.api_delay, delay);
    }

    pub fn set_version_text(&self, text: &str) {
        set(&self.state.version_text, text.to_string());
    }

    pub fn set_api_body(&self, body: &str) {
        set(&self.state.api_body, body.to_string());
    }

    /// Number of accepted logins.
    pub fn logins(&self) -> usize {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.state.logouts.load(Ordering::SeqCst)
    }

    pub fn version_calls(&self) -> usize {
        self.state.version_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.state.api_calls.load(Ordering::SeqCst)
    }

    /// Number of requests received on the login endpoint, accepted or not.
    pub async fn login_attempts(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == "/api/v2/auth/login")
            .count()
    }
}
