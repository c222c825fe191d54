//! Run command - acquire the server and hand it the terminal

use anyhow::{Context, Result};

use crate::launch::launch;
use crate::translate::ServerFlags;
use crate::ui::Output;

/// Acquire `version`, translate flags and run the server.
///
/// Returns the exit status the wrapper should end with.
pub async fn run(
    version: &str,
    platform: Option<&str>,
    flags: ServerFlags,
    passthrough: &[String],
) -> Result<i32> {
    let output = Output::new();
    let acquirer = super::acquirer(&output)?;

    if !acquirer.is_cached(version, platform) {
        output.info(&format!(
            "Binary not found for version {version}. Downloading..."
        ));
    }
    let executable = super::acquire_or_interrupt(&acquirer, version, platform, false)
        .await
        .with_context(|| format!("Failed to prepare server version {version}"))?;

    output.info(&format!(
        "Starting Unity MCP Server (version: {version}, transport: {})...",
        flags.transport
    ));

    let args = flags.to_args(passthrough);
    launch(&executable, &args, &output).await
}
