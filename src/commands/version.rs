//! `version` command: report server application versions.

use anyhow::{Context, Result, bail};
use futures_util::future::join_all;
use qbremote_core::{RequestError, RequestOrchestrator, ServerId, ServerRegistry, Version};
use tracing::{debug, warn};

pub async fn run_version_command(
    orchestrator: &RequestOrchestrator,
    server: ServerId,
) -> Result<()> {
    let version = fetch_version(orchestrator, server)
        .await
        .with_context(|| format!("cannot read version of server {server}"))?;
    println!("{server}\t{version}");
    Ok(())
}

/// Queries every configured server concurrently and prints one line each.
///
/// Fails after printing all lines if any server could not be queried.
pub async fn run_version_all_command(
    orchestrator: &RequestOrchestrator,
    registry: &ServerRegistry,
) -> Result<()> {
    let ids = registry.ids();
    debug!(servers = ids.len(), "querying all servers");

    let results = join_all(
        ids.iter()
            .map(|&server| async move { (server, fetch_version(orchestrator, server).await) }),
    )
    .await;

    let mut failed = 0usize;
    for (server, result) in &results {
        match result {
            Ok(version) => println!("{server}\t{version}"),
            Err(error) => {
                failed += 1;
                warn!(server = %server, error = %error, "version query failed");
                println!("{server}\terror: {error}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} servers could not be queried", results.len());
    }
    Ok(())
}

/// Refreshes (logging in first if needed) and returns the cached version.
async fn fetch_version(
    orchestrator: &RequestOrchestrator,
    server: ServerId,
) -> Result<Version, RequestError> {
    orchestrator.ensure_version_fresh(server).await
}
