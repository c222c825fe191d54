//! Download command

use anyhow::{Context, Result};

use crate::ui::Output;

/// Download (or reuse) the server for `version` and print its path.
pub async fn download(version: &str, platform: Option<&str>, force: bool) -> Result<()> {
    let output = Output::new();
    let acquirer = super::acquirer(&output)?;

    output.info(&format!("Downloading Unity MCP Server (version: {version})..."));
    if !force && acquirer.is_cached(version, platform) {
        output.warning("Already cached, use --force to download again");
    }

    let path = super::acquire_or_interrupt(&acquirer, version, platform, force)
        .await
        .with_context(|| format!("Failed to download server version {version}"))?;

    output.success("Download complete");
    println!("{}", path.display());
    Ok(())
}
