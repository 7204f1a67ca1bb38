//! P0: passwords stay out of debug output and error messages, and session
//! cookies never cross from one server to another.

use qbremote_core::{ServerConfig, ServerId, parse_servers_json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::fake_webui::FakeWebUi;
use crate::support::socket_guard::{socket_skip_return, start_mock_server_or_skip};
use crate::support::{PASSWORD, get, server_config, single};

const TORRENTS: &str = "api/v2/torrents/info";

#[test]
fn p0_server_config_debug_redacts_secrets() {
    let config = ServerConfig::new(ServerId::new(1), "http://nas:8080")
        .with_credentials("admin", "hunter2")
        .with_basic_auth("proxy", Some("proxy-secret".to_string()));

    let rendered = format!("{config:?}");

    assert!(rendered.contains("admin"));
    assert!(!rendered.contains("hunter2"), "{rendered}");
    assert!(!rendered.contains("proxy-secret"), "{rendered}");
}

#[test]
fn p0_config_errors_do_not_echo_passwords() {
    let raw = r#"[{"id": 1, "base_url": "ftp://nas", "username": "a", "password": "hunter2"}]"#;
    let err = parse_servers_json(raw).expect_err("ftp is rejected");
    assert!(!err.to_string().contains("hunter2"), "{err}");
}

#[tokio::test]
async fn p0_login_error_message_does_not_contain_password() {
    let Some(webui) = FakeWebUi::start_with_credentials("admin", "other").await else {
        return socket_skip_return();
    };

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()));
    let err = get(&orchestrator, 1, TORRENTS)
        .await
        .expect_err("wrong password");

    assert!(!err.to_string().contains(PASSWORD), "{err}");
    assert!(!format!("{err:?}").contains(PASSWORD), "{err:?}");
}

#[tokio::test]
async fn p0_session_cookie_is_not_sent_to_other_servers() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    let Some(other) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&other)
        .await;

    let (registry, orchestrator) = single(server_config(1, &webui.uri()));
    registry
        .add(ServerConfig::new(ServerId::new(2), other.uri()))
        .expect("add anonymous server");

    get(&orchestrator, 1, TORRENTS).await.expect("server 1");
    get(&orchestrator, 2, TORRENTS).await.expect("server 2");

    let requests = other.received_requests().await.unwrap_or_default();
    assert!(!requests.is_empty());
    for request in requests {
        assert!(
            request.headers.get("cookie").is_none(),
            "server 2 received a cookie: {:?}",
            request.headers.get("cookie")
        );
        assert!(
            !String::from_utf8_lossy(&request.body).contains(PASSWORD),
            "server 2 received server 1's password"
        );
    }
}
