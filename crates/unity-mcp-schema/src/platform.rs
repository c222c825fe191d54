//! Host platform identification.
//!
//! Release assets are published per `{os}-{arch}` token (e.g. `win-x64`,
//! `macos-arm64`). This module maps the OS and CPU names reported by the host
//! onto those tokens and knows which combinations are actually published.
//!
//! # Example
//!
//! ```
//! use unity_mcp_schema::PlatformToken;
//!
//! let token = PlatformToken::from_host("Darwin", "aarch64");
//! assert_eq!(token.to_string(), "macos-arm64");
//! assert!(token.is_supported());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing an explicit platform token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The token is not of the form `<os>-<arch>`.
    #[error("Malformed platform token '{0}': expected '<os>-<arch>'")]
    Malformed(String),

    /// The architecture part is not one we know how to name.
    #[error("Unknown architecture: {0}")]
    UnknownArch(String),
}

/// Operating system family of a platform token.
///
/// Names that do not match a known family are kept verbatim in
/// [`OsFamily::Other`]; such tokens are representable but never supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Microsoft Windows (`win`).
    Windows,
    /// Linux-based systems (`linux`).
    Linux,
    /// Apple macOS (`macos`).
    MacOs,
    /// Any other OS name, passed through unchanged.
    Other(String),
}

impl OsFamily {
    /// Map a host OS name onto a family. Matching is case-insensitive.
    ///
    /// Accepts the names reported by Python-style introspection (`Darwin`,
    /// `Windows`), by `std::env::consts::OS` (`macos`), and the canonical
    /// token tags themselves (`win`).
    pub fn normalize(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "windows" | "win" => Self::Windows,
            "linux" => Self::Linux,
            "darwin" | "macos" | "osx" => Self::MacOs,
            _ => Self::Other(name.to_string()),
        }
    }

    /// Canonical tag used inside platform tokens.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Windows => "win",
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture of a platform token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arch {
    /// 64-bit Intel/AMD (`x64`). Also the fallback for unknown hosts.
    #[default]
    X64,
    /// 32-bit Intel (`x86`).
    X86,
    /// 64-bit ARM (`arm64`).
    Arm64,
}

impl Arch {
    /// Recognize an architecture name, case-insensitively.
    pub fn recognize(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Some(Self::X64),
            "i386" | "i686" | "x86" => Some(Self::X86),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Map a host CPU name onto an architecture, defaulting to x64 for
    /// anything unrecognized.
    pub fn normalize(name: &str) -> Self {
        Self::recognize(name).unwrap_or_default()
    }

    /// Canonical tag used inside platform tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::recognize(s).ok_or_else(|| PlatformError::UnknownArch(s.to_string()))
    }
}

/// Combinations the release pipeline actually publishes.
const PUBLISHED: [(OsFamily, Arch); 7] = [
    (OsFamily::Windows, Arch::X64),
    (OsFamily::Windows, Arch::X86),
    (OsFamily::Windows, Arch::Arm64),
    (OsFamily::MacOs, Arch::X64),
    (OsFamily::MacOs, Arch::Arm64),
    (OsFamily::Linux, Arch::X64),
    (OsFamily::Linux, Arch::Arm64),
];

/// An `{os}-{arch}` pair identifying a class of hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformToken {
    /// Operating system family.
    pub os: OsFamily,
    /// CPU architecture.
    pub arch: Arch,
}

impl PlatformToken {
    /// Build a token from its parts.
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Map raw host facts (OS name, CPU name) onto a token.
    ///
    /// Never fails: unknown OS names pass through, unknown CPUs become x64.
    pub fn from_host(os_name: &str, arch_name: &str) -> Self {
        Self::new(OsFamily::normalize(os_name), Arch::normalize(arch_name))
    }

    /// Token describing the machine this process runs on.
    pub fn current() -> Self {
        Self::from_host(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Whether release assets are published for this token.
    pub fn is_supported(&self) -> bool {
        PUBLISHED
            .iter()
            .any(|(os, arch)| *os == self.os && *arch == self.arch)
    }

    /// Whether this token targets Windows.
    pub fn is_windows(&self) -> bool {
        self.os == OsFamily::Windows
    }
}

impl fmt::Display for PlatformToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

impl FromStr for PlatformToken {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (os, arch) = trimmed
            .rsplit_once('-')
            .filter(|(os, arch)| !os.is_empty() && !arch.is_empty())
            .ok_or_else(|| PlatformError::Malformed(s.to_string()))?;

        Ok(Self::new(OsFamily::normalize(os), arch.parse()?))
    }
}

impl Serialize for PlatformToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlatformToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Resolve the token for the current host.
pub fn resolve() -> PlatformToken {
    PlatformToken::current()
}

/// Check a token string against the published set.
///
/// Strings that do not parse as a token are reported as unsupported.
pub fn is_supported(token: &str) -> bool {
    token
        .parse::<PlatformToken>()
        .is_ok_and(|t| t.is_supported())
}

/// Every published platform token.
pub fn supported_platforms() -> Vec<PlatformToken> {
    PUBLISHED
        .iter()
        .map(|(os, arch)| PlatformToken::new(os.clone(), *arch))
        .collect()
}
