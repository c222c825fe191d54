//! Clear-cache command

use anyhow::{Context, Result};

use crate::ui::Output;

/// Remove one cached version, or every cached server.
pub fn clear_cache(version: Option<&str>) -> Result<()> {
    let output = Output::new();
    let acquirer = super::acquirer(&output)?;
    let root = acquirer.cache().root().display().to_string();

    acquirer
        .clear_cache(version)
        .with_context(|| format!("Failed to clear cache at {root}"))?;

    match version {
        Some(v) => output.success(&format!("Removed version {v} from {root}")),
        None => output.success(&format!("Cleared {root}")),
    }
    Ok(())
}
