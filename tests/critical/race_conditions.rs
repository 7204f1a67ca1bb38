//! P0: concurrent first use, concurrent session expiry, cross-server independence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use qbremote_core::{OrchestratorOptions, ServerId};

use crate::support::fake_webui::FakeWebUi;
use crate::support::socket_guard::socket_skip_return;
use crate::support::{attached, get, server_config, single};

const TORRENTS: &str = "api/v2/torrents/info";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_concurrent_first_requests_share_one_login() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    webui.set_login_delay(Duration::from_millis(200));

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()));
    let results = join_all((0..10).map(|_| get(&orchestrator, 1, TORRENTS))).await;

    for result in results {
        result.expect("every caller succeeds");
    }
    assert_eq!(webui.login_attempts().await, 1, "exactly one login call");
    assert_eq!(webui.api_calls(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_concurrent_spawned_tasks_share_one_login() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    webui.set_login_delay(Duration::from_millis(200));

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orchestrator = std::sync::Arc::clone(&orchestrator);
            tokio::spawn(async move { get(&orchestrator, 1, TORRENTS).await })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task joined").expect("request succeeds");
    }
    assert_eq!(webui.login_attempts().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_concurrent_expiry_renews_session_once() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()));
    get(&orchestrator, 1, TORRENTS).await.expect("warm up");
    assert_eq!(webui.logins(), 1);

    webui.expire_session();
    webui.set_login_delay(Duration::from_millis(100));
    let results = join_all((0..8).map(|_| get(&orchestrator, 1, TORRENTS))).await;

    for result in results {
        result.expect("every caller recovers");
    }
    assert_eq!(webui.logins(), 2, "one shared renewal for all expired callers");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_requests_after_login_run_in_parallel() {
    let Some(webui) = FakeWebUi::start().await else {
        return socket_skip_return();
    };

    let (_registry, orchestrator) = single(server_config(1, &webui.uri()));
    get(&orchestrator, 1, TORRENTS).await.expect("warm up");

    webui.set_api_delay(Duration::from_millis(300));
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let tracked = || {
        orchestrator.execute(ServerId::new(1), |client| {
            let (in_flight, peak) = (&in_flight, &peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let response = client.get(TORRENTS, &[]).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                response
            }
        })
    };
    let results = join_all((0..4).map(|_| tracked())).await;

    for result in results {
        result.expect("request succeeds");
    }
    assert_eq!(webui.logins(), 1);
    assert!(
        peak.load(Ordering::SeqCst) > 1,
        "requests were serialized behind each other"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn p0_slow_login_on_one_server_does_not_block_another() {
    let Some(slow) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    let Some(fast) = FakeWebUi::start().await else {
        return socket_skip_return();
    };
    slow.set_login_delay(Duration::from_secs(2));

    let (_registry, orchestrator) = attached(
        vec![server_config(1, &slow.uri()), server_config(2, &fast.uri())],
        OrchestratorOptions::default(),
    );

    let slow_task = {
        let orchestrator = std::sync::Arc::clone(&orchestrator);
        tokio::spawn(async move { get(&orchestrator, 1, TORRENTS).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let fast_result =
        tokio::time::timeout(Duration::from_secs(1), get(&orchestrator, 2, TORRENTS)).await;
    assert!(
        matches!(fast_result, Ok(Ok(_))),
        "server 2 must not wait for server 1's login"
    );

    slow_task
        .await
        .expect("task joined")
        .expect("slow server eventually succeeds");
}
