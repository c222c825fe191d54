//! Status command - platform and cache overview

use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use serde::Serialize;
use unity_mcp_core::acquire::resolve_platform;
use unity_mcp_schema::{PlatformToken, remote_asset_name, supported_platforms};

use crate::WRAPPER_VERSION;
use crate::ui::{Output, Theme};

/// Snapshot printed by `unity-mcp status`.
#[derive(Debug, Serialize)]
pub struct Status {
    pub wrapper_version: String,
    pub server_version: String,
    pub platform: String,
    pub supported: bool,
    pub supported_platforms: Vec<PlatformToken>,
    pub asset: Option<String>,
    pub cache_root: PathBuf,
    pub cached: bool,
    pub executable: Option<PathBuf>,
    pub cached_versions: Vec<String>,
}

/// Show what would be run and what is cached.
pub fn status(version: &str, platform: Option<&str>, json: bool) -> Result<()> {
    let acquirer = super::acquirer(&Output::quiet())?;
    let cache = acquirer.cache();

    let resolved = resolve_platform(platform);
    let platform_label = match (&resolved, platform) {
        (Ok(token), _) => token.to_string(),
        (Err(_), Some(raw)) => raw.to_string(),
        (Err(_), None) => PlatformToken::current().to_string(),
    };
    let cached = acquirer.is_cached(version, platform);

    let status = Status {
        wrapper_version: WRAPPER_VERSION.to_string(),
        server_version: version.to_string(),
        supported: resolved.is_ok(),
        supported_platforms: supported_platforms(),
        asset: resolved
            .as_ref()
            .ok()
            .map(|t| remote_asset_name(version, t)),
        cache_root: cache.root().to_path_buf(),
        cached,
        executable: resolved
            .as_ref()
            .ok()
            .filter(|_| cached)
            .and_then(|t| cache.find_executable(version, t)),
        cached_versions: cache
            .versions()
            .with_context(|| format!("Failed to read {}", cache.root().display()))?,
        platform: platform_label,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_status(status: &Status) {
    let theme = Theme::default();
    let label_width = 12;
    let row = |label: &str, value: String| {
        println!(
            "{}  {value}",
            format!("{label:<label_width$}").with(theme.colors.secondary)
        );
    };

    row("Wrapper", status.wrapper_version.clone());
    row("Server", status.server_version.clone());

    let support = if status.supported {
        theme.icons.success.with(theme.colors.success).to_string()
    } else {
        format!(
            "{} unsupported",
            theme.icons.error.with(theme.colors.error)
        )
    };
    row("Platform", format!("{} {support}", status.platform));
    if let Some(asset) = &status.asset {
        row("Asset", asset.clone());
    }
    row("Cache", status.cache_root.display().to_string());

    match &status.executable {
        Some(path) => row(
            "Executable",
            path.display().to_string().with(theme.colors.highlight).to_string(),
        ),
        None => row("Executable", "not cached".with(theme.colors.warning).to_string()),
    }

    if !status.cached_versions.is_empty() {
        row("Versions", status.cached_versions.join(", "));
    }
}
