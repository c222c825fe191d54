//! Command implementations.

pub mod clear_cache;
pub mod completions;
pub mod download;
pub mod run;
pub mod status;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context, Result};
use unity_mcp_core::{AcquireConfig, Acquirer, HttpFetcher};

use crate::Interrupted;
use crate::ui::Output;

/// Acquirer configured from the environment, reporting through `output`.
pub(crate) fn acquirer(output: &Output) -> Result<Acquirer<HttpFetcher, Output>> {
    let config = AcquireConfig::from_env();
    tracing::debug!(?config, "acquisition settings");
    let acquirer = Acquirer::new(config).context("Failed to initialize downloader")?;
    Ok(acquirer.with_reporter(output.clone()))
}

/// Acquire the server, giving up cleanly on Ctrl-C.
///
/// Dropping the in-flight acquisition removes its scratch and staging
/// directories, so an interrupt never leaves a partial cache entry.
pub(crate) async fn acquire_or_interrupt(
    acquirer: &Acquirer<HttpFetcher, Output>,
    version: &str,
    platform: Option<&str>,
    force: bool,
) -> Result<PathBuf> {
    tokio::select! {
        result = acquirer.acquire(version, platform, force) => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted during acquisition");
            Err(Interrupted.into())
        }
    }
}
