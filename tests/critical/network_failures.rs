//! P0: refused connections and timeouts surface as network errors, never retried.

use qbremote_core::{RequestError, ServerConfig, ServerId, TransportError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::support::fake_webui::FakeWebUi;
use crate::support::socket_guard::{socket_skip_return, start_mock_server_or_skip};
use crate::support::{closed_port_url, get, server_config, single};

const TORRENTS: &str = "api/v2/torrents/info";

#[tokio::test]
async fn p0_connection_refused_during_login_is_network_error() {
    let (_registry, orchestrator) = single(server_config(1, &closed_port_url()));

    let err = get(&orchestrator, 1, TORRENTS)
        .await
        .expect_err("nothing is listening");

    assert!(err.is_network(), "expected network error, got {err:?}");
    assert!(!err.is_auth_failure());
    assert!(err.to_string().contains("unreachable"), "{err}");
}

#[tokio::test]
async fn p0_connection_refused_for_anonymous_server_is_network_error() {
    let config = ServerConfig::new(ServerId::new(1), closed_port_url());
    let (_registry, orchestrator) = single(config);

    let result = get(&orchestrator, 1, TORRENTS).await;

    assert!(matches!(result, Err(RequestError::Network(_))));
}

#[tokio::test]
async fn p0_login_timeout_is_reported_as_timeout() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    webui.set_login_delay(std::time::Duration::from_secs(3));

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()).with_timeout_secs(1));
    let result = get(&orchestrator, 1, TORRENTS).await;

    assert!(
        matches!(result, Err(RequestError::Network(TransportError::Timeout { .. }))),
        "expected timeout, got {result:?}"
    );
}

#[tokio::test]
async fn p0_request_timeout_is_not_retried() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = server_config(1, &mock_server.uri()).with_timeout_secs(1);
    let (_registry, orchestrator) = single(config);
    let result = get(&orchestrator, 1, TORRENTS).await;

    assert!(matches!(result, Err(RequestError::Network(ref e)) if e.is_timeout()));
}

#[tokio::test]
async fn p0_server_recovers_after_outage_on_next_call() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };

    // First point the server at a dead port, then fix the configuration.
    let (registry, orchestrator) = single(server_config(1, &closed_port_url()));
    assert!(get(&orchestrator, 1, TORRENTS).await.is_err());

    registry
        .edit(server_config(1, &webui.uri()))
        .expect("edit to live server");
    get(&orchestrator, 1, TORRENTS)
        .await
        .expect("live server answers");
    assert_eq!(webui.logins(), 1);
}
