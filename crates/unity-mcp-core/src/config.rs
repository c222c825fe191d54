//! Acquisition settings, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use unity_mcp_schema::DEFAULT_RELEASE_URL;

/// Environment variable selecting the server version.
pub const VERSION_ENV: &str = "UNITY_MCP_VERSION";

/// Environment variable overriding the release download origin.
pub const RELEASE_URL_ENV: &str = "UNITY_MCP_RELEASE_URL";

/// Environment variable overriding the download timeout, in seconds.
pub const TIMEOUT_ENV: &str = "UNITY_MCP_DOWNLOAD_TIMEOUT";

/// Configuration for an [`Acquirer`](crate::Acquirer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireConfig {
    /// Directory owning every cache entry.
    pub cache_root: PathBuf,
    /// Origin serving `<version>/<asset>` archives.
    pub release_base_url: String,
    /// Upper bound on a single archive download.
    pub timeout: Duration,
}

impl AcquireConfig {
    /// Default download timeout (5 minutes).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Configuration rooted at `cache_root` with default origin and timeout.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            release_base_url: DEFAULT_RELEASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or empty variables fall back to defaults; an unparsable timeout
    /// is ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::new(crate::paths::cache_root());

        if let Some(url) = std::env::var(RELEASE_URL_ENV).ok().filter(|v| !v.is_empty()) {
            config.release_base_url = url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %raw, "ignoring invalid {TIMEOUT_ENV}"),
            }
        }

        config
    }

    /// Replace the cache root.
    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    /// Replace the release origin.
    pub fn with_release_base_url(mut self, url: impl Into<String>) -> Self {
        self.release_base_url = url.into();
        self
    }

    /// Replace the download timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
