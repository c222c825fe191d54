//! Release asset naming.
//!
//! Every published release carries one archive per platform token, named
//! `unity-mcp-server-<version>-<token>.<ext>`. Windows archives are zips,
//! everything else is a gzip-compressed tarball. Names are derived for any
//! token, supported or not; rejecting unsupported tokens is the caller's job.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlatformToken;

/// Base name shared by the executable and its release archives.
pub const BASE_NAME: &str = "unity-mcp-server";

/// Default origin serving release archives.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/ivanmurzak/unity-mcp/releases/download";

/// Container format of a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Zip archive (`.zip`).
    #[serde(rename = "zip")]
    Zip,
    /// Gzip-compressed tar archive (`.tar.gz`).
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl ArchiveFormat {
    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Executable filename inside the archive (`.exe` only on Windows).
pub fn executable_name(token: &PlatformToken) -> String {
    if token.is_windows() {
        format!("{BASE_NAME}.exe")
    } else {
        BASE_NAME.to_string()
    }
}

/// Archive container used for a token.
pub fn archive_format(token: &PlatformToken) -> ArchiveFormat {
    if token.is_windows() {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::TarGz
    }
}

/// Remote archive filename for a version and token.
///
/// The version is used verbatim; no shape validation happens here.
pub fn remote_asset_name(version: &str, token: &PlatformToken) -> String {
    format!(
        "{BASE_NAME}-{version}-{token}.{}",
        archive_format(token).extension()
    )
}

/// Everything needed to locate and unpack one release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    /// Release version, verbatim.
    pub version: String,
    /// Target platform.
    pub platform: PlatformToken,
    /// Remote archive filename.
    pub archive_filename: String,
    /// Archive container format.
    pub archive_format: ArchiveFormat,
}

impl AssetDescriptor {
    /// Derive the descriptor for a version and token.
    pub fn new(version: &str, platform: &PlatformToken) -> Self {
        Self {
            version: version.to_string(),
            platform: platform.clone(),
            archive_filename: remote_asset_name(version, platform),
            archive_format: archive_format(platform),
        }
    }

    /// Download URL of the archive under a release origin
    /// (`<base>/<version>/<archive>`).
    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.version,
            self.archive_filename
        )
    }

    /// Executable filename this archive is expected to contain.
    pub fn executable_name(&self) -> String {
        executable_name(&self.platform)
    }
}
