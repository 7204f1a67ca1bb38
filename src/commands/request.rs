//! `login`, `get` and `post` command handlers.

use anyhow::{Context, Result};
use qbremote_core::{RequestOrchestrator, ServerId};
use tracing::info;

pub async fn run_login_command(
    orchestrator: &RequestOrchestrator,
    server: ServerId,
) -> Result<()> {
    orchestrator
        .login(server)
        .await
        .with_context(|| format!("login to server {server} failed"))?;
    info!(server = %server, "login succeeded");
    println!("{server}\tlogged in");
    Ok(())
}

pub async fn run_get_command(
    orchestrator: &RequestOrchestrator,
    server: ServerId,
    path: &str,
    params: &[(String, String)],
) -> Result<()> {
    let pairs = as_pairs(params);
    let pairs = pairs.as_slice();
    let body = orchestrator
        .execute(server, |client| async move { client.get(path, pairs).await })
        .await
        .with_context(|| format!("GET {path} on server {server} failed"))?;
    println!("{body}");
    Ok(())
}

pub async fn run_post_command(
    orchestrator: &RequestOrchestrator,
    server: ServerId,
    path: &str,
    fields: &[(String, String)],
) -> Result<()> {
    let pairs = as_pairs(fields);
    let pairs = pairs.as_slice();
    let body = orchestrator
        .execute(server, |client| async move { client.post_form(path, pairs).await })
        .await
        .with_context(|| format!("POST {path} on server {server} failed"))?;
    if !body.is_empty() {
        println!("{body}");
    }
    Ok(())
}

fn as_pairs(owned: &[(String, String)]) -> Vec<(&str, &str)> {
    owned
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}
