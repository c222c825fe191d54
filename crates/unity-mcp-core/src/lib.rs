//! Core library for the Unity MCP server wrapper.
//!
//! Resolves the release archive for the host platform, downloads it into a
//! per-version cache, unpacks it and hands back a runnable executable path.
//!
//! # Directory Layout
//!
//! ```text
//! <cache_root>/
//! ├── .tmp/                      # staging trees, renamed into place on success
//! └── <version>/
//!     └── <token>/               # cache entry (e.g. linux-x64)
//!         └── <token>/           # platform directory embedded in the archive
//!             └── unity-mcp-server[.exe]
//! ```

pub mod acquire;
pub mod cache;
pub mod config;
pub mod io;
pub mod paths;
pub mod reporter;

pub use acquire::{AcquireError, Acquirer};
pub use cache::CacheStore;
pub use config::AcquireConfig;
pub use io::download::{DownloadError, Fetcher, HttpFetcher};
pub use io::extract::ExtractError;
pub use reporter::{NullReporter, Reporter};

/// User Agent string sent with every download request
pub const USER_AGENT: &str = concat!("unity-mcp/", env!("CARGO_PKG_VERSION"));
