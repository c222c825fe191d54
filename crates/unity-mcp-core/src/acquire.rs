//! Acquisition pipeline.
//!
//! `acquire` turns `(version, platform, force)` into the path of a runnable
//! executable: resolve the platform, check the cache, otherwise download the
//! release archive into a scratch directory, unpack it into a staging tree,
//! verify the executable is there, and rename the tree into the cache.
//!
//! A failure at any step leaves the existing cache entry untouched.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use unity_mcp_schema::{AssetDescriptor, PlatformToken, supported_platforms};

use crate::io::download::{DownloadError, Fetcher, HttpFetcher};
use crate::io::extract::{self, ExtractError};
use crate::cache::{STAGING_DIR, locate_executable};
use crate::{AcquireConfig, CacheStore, NullReporter, Reporter};

/// Why an acquisition failed.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// The version string cannot name a cache directory.
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// No release is published for this platform. Never retried.
    #[error("Platform '{platform}' is not supported (supported: {supported})")]
    PlatformNotSupported {
        /// The rejected token as given or detected.
        platform: String,
        /// Comma-separated published tokens.
        supported: String,
    },

    /// Network, HTTP status, timeout or write failure while downloading.
    #[error("Download failed: {0}")]
    DownloadFailed(#[from] DownloadError),

    /// The archive could not be unpacked. Re-downloading with `force` may help.
    #[error("Archive is corrupt: {0}")]
    ArchiveCorrupt(#[from] ExtractError),

    /// The archive unpacked cleanly but did not contain the executable.
    #[error("Executable '{name}' not found in archive {archive}")]
    ExecutableMissing {
        /// Expected executable filename.
        name: String,
        /// Archive that was unpacked.
        archive: String,
    },

    /// Filesystem failure outside download and extraction.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AcquireError {
    /// Process exit status distinguishing the failure category.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::InvalidVersion(_) => 2,
            Self::PlatformNotSupported { .. } => 3,
            Self::DownloadFailed(_) => 4,
            Self::ArchiveCorrupt(_) => 5,
            Self::ExecutableMissing { .. } => 6,
        }
    }

    fn unsupported(platform: impl Into<String>) -> Self {
        let supported = supported_platforms()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::PlatformNotSupported {
            platform: platform.into(),
            supported,
        }
    }
}

/// Resolve an optional explicit token, defaulting to the host.
///
/// # Errors
///
/// Returns [`AcquireError::PlatformNotSupported`] if the token does not parse
/// or is not published.
pub fn resolve_platform(platform: Option<&str>) -> Result<PlatformToken, AcquireError> {
    let token = match platform {
        Some(raw) => raw
            .parse::<PlatformToken>()
            .map_err(|_| AcquireError::unsupported(raw))?,
        None => PlatformToken::current(),
    };

    if token.is_supported() {
        Ok(token)
    } else {
        Err(AcquireError::unsupported(token.to_string()))
    }
}

/// Versions become directory names; refuse ones that would escape the root
/// or collide with the staging area.
fn check_version(version: &str) -> Result<(), AcquireError> {
    let bad = version.trim().is_empty()
        || version == "."
        || version == ".."
        || version == STAGING_DIR
        || version.contains(['/', '\\']);
    if bad {
        Err(AcquireError::InvalidVersion(version.to_string()))
    } else {
        Ok(())
    }
}

/// Coordinates platform resolution, cache, download and extraction.
#[derive(Debug)]
pub struct Acquirer<F = HttpFetcher, R = NullReporter> {
    config: AcquireConfig,
    cache: CacheStore,
    fetcher: F,
    reporter: R,
}

impl Acquirer {
    /// Acquirer downloading over HTTP with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::DownloadFailed`] if the HTTP client cannot be built.
    pub fn new(config: AcquireConfig) -> Result<Self, AcquireError> {
        let fetcher = HttpFetcher::new(config.timeout)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> Acquirer<F> {
    /// Acquirer using a custom fetcher.
    pub fn with_fetcher(config: AcquireConfig, fetcher: F) -> Self {
        let cache = CacheStore::new(&config.cache_root);
        Self {
            config,
            cache,
            fetcher,
            reporter: NullReporter,
        }
    }
}

impl<F: Fetcher, R: Reporter> Acquirer<F, R> {
    /// Replace the progress reporter.
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> Acquirer<F, R2> {
        Acquirer {
            config: self.config,
            cache: self.cache,
            fetcher: self.fetcher,
            reporter,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AcquireConfig {
        &self.config
    }

    /// Underlying cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Ensure a runnable executable for `version` exists and return its path.
    ///
    /// `platform` overrides host detection. Without `force` a cached
    /// executable is returned with no network access; with `force` the
    /// release is downloaded again and replaces the cache entry.
    ///
    /// # Errors
    ///
    /// See [`AcquireError`]. Every failure leaves the previous cache entry
    /// for this `(version, platform)` as it was.
    pub async fn acquire(
        &self,
        version: &str,
        platform: Option<&str>,
        force: bool,
    ) -> Result<PathBuf, AcquireError> {
        check_version(version)?;
        let token = resolve_platform(platform)?;

        let cached = if force {
            None
        } else {
            self.cache.find_executable(version, &token)
        };
        if let Some(path) = cached {
            debug!(path = %path.display(), "cache hit");
            return Ok(path);
        }

        self.cache.ensure_version_dir(version)?;
        let asset = AssetDescriptor::new(version, &token);

        let result = self.install(&asset).await;
        match &result {
            Ok(path) => self.reporter.done(&asset.archive_filename, &path.display().to_string()),
            Err(e) => self.reporter.failed(&asset.archive_filename, &e.to_string()),
        }
        result
    }

    async fn install(&self, asset: &AssetDescriptor) -> Result<PathBuf, AcquireError> {
        let staging = self.cache.staging_dir()?;

        // Download and extract inside a scratch directory that is removed on
        // every exit path, including cancellation of this future.
        let files = {
            let scratch = tempfile::Builder::new()
                .prefix("unity-mcp-download-")
                .tempdir()?;
            let archive_path = scratch.path().join(&asset.archive_filename);
            let url = asset.download_url(&self.config.release_base_url);

            info!(%url, "downloading server release");
            self.reporter.info(&format!("Downloading {url}"));
            let bytes = self
                .fetcher
                .fetch(&url, &archive_path, &self.reporter)
                .await?;
            debug!(bytes, "download complete");

            self.reporter.extracting(&asset.archive_filename);
            let dest = staging.path().to_path_buf();
            let platform = asset.platform.clone();
            let files = tokio::task::spawn_blocking(move || {
                extract::extract(&archive_path, &dest, &platform)
            })
            .await
            .map_err(io::Error::other)??;
            info!(files = files.len(), "extracted archive");

            if let Err(e) = scratch.close() {
                warn!(error = %e, "failed to remove download directory");
            }
            files
        };

        let relative = locate_executable(staging.path(), &asset.platform).ok_or_else(|| {
            AcquireError::ExecutableMissing {
                name: asset.executable_name(),
                archive: asset.archive_filename.clone(),
            }
        })?;

        let canonical = PathBuf::from(asset.platform.to_string()).join(asset.executable_name());
        if relative != canonical {
            warn!(
                expected = %canonical.display(),
                found = %relative.display(),
                "executable not at canonical location"
            );
        }
        let marked = files
            .iter()
            .any(|f| f.relative_path == relative && f.is_executable);
        if !marked {
            debug!(path = %relative.display(), "archive did not mark executable, setting mode");
        }

        let entry = self
            .cache
            .publish(staging, &asset.version, &asset.platform)?;
        let executable = entry.join(relative);
        make_executable(&executable)?;

        info!(path = %executable.display(), "server executable ready");
        Ok(executable)
    }

    /// Whether `version` is cached for `platform` (or the host).
    /// Unparsable or unsupported platforms are never cached.
    pub fn is_cached(&self, version: &str, platform: Option<&str>) -> bool {
        if check_version(version).is_err() {
            return false;
        }
        resolve_platform(platform).is_ok_and(|token| self.cache.exists(version, &token))
    }

    /// Remove one version from the cache, or everything with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::InvalidVersion`] for versions that cannot name
    /// a cache directory, and [`AcquireError::Io`] on filesystem failures.
    pub fn clear_cache(&self, version: Option<&str>) -> Result<(), AcquireError> {
        if let Some(version) = version {
            check_version(version)?;
        }
        self.cache.clear(version)?;
        Ok(())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
