//! Well-known filesystem locations.

use std::path::PathBuf;

use dirs::{cache_dir, home_dir};
use unity_mcp_schema::BASE_NAME;

/// Environment variable overriding the cache root.
pub const HOME_ENV: &str = "UNITY_MCP_HOME";

/// Returns the cache root, or None if no per-user location can be resolved.
///
/// Order: `$UNITY_MCP_HOME`, the platform cache directory
/// (`~/.cache/unity-mcp-server` on Linux), then `~/.unity-mcp-server`.
pub fn try_cache_root() -> Option<PathBuf> {
    if let Some(val) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(val));
    }
    cache_dir()
        .map(|c| c.join(BASE_NAME))
        .or_else(|| home_dir().map(|h| h.join(format!(".{BASE_NAME}"))))
}

/// Cache root, falling back to the system temp directory when the user's
/// home cannot be resolved.
pub fn cache_root() -> PathBuf {
    try_cache_root().unwrap_or_else(|| std::env::temp_dir().join(BASE_NAME))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
