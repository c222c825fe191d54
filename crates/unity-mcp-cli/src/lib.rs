//! unity-mcp - launcher for the Unity MCP server
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Downloads the prebuilt `unity-mcp-server` release for the host platform,
//! keeps it in a per-version cache and runs it with the caller's stdio.
//!
//! # Streams
//!
//! In stdio transport mode stdout carries the MCP protocol between the
//! client and the child process. Everything this wrapper prints while
//! launching (logs, progress, errors) therefore goes to stderr.

pub mod cmd;
pub mod launch;
pub mod translate;
pub mod ui;

use std::fmt;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use unity_mcp_core::AcquireError;
use unity_mcp_core::config::VERSION_ENV;

/// Wrapper version, also the default server version.
pub const WRAPPER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "unity-mcp")]
#[command(
    author,
    about = "Unity MCP Server - AI-powered bridge to Unity Editor/Runtime",
    disable_version_flag = true,
    after_help = "Environment Variables:\n  \
        UNITY_MCP_VERSION           Server version to use (default: wrapper version)\n  \
        UNITY_MCP_HOME              Cache directory for downloaded servers\n  \
        UNITY_MCP_RELEASE_URL       Origin serving release archives\n  \
        UNITY_MCP_DOWNLOAD_TIMEOUT  Download timeout in seconds (default: 300)"
)]
pub struct Cli {
    /// Transport mode for MCP client communication
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Port for HTTP transport and plugin communication
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Plugin connection timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub plugin_timeout: u64,

    /// Platform token to use instead of the host (e.g. linux-x64)
    #[arg(long, value_name = "TOKEN")]
    pub platform: Option<String>,

    /// Server version to run
    #[arg(long, env = VERSION_ENV, value_name = "VERSION")]
    pub server_version: Option<String>,

    /// Show version information and exit
    #[arg(short = 'V', long)]
    pub version: bool,

    /// Extra arguments passed to the server after `--`
    #[arg(last = true, value_name = "SERVER_ARGS")]
    pub args: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download the Unity MCP Server binary
    Download {
        /// Specific version to download
        #[arg(long)]
        version: Option<String>,
        /// Platform token to download for
        #[arg(long, value_name = "TOKEN")]
        platform: Option<String>,
        /// Force re-download even if binary exists
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// Remove downloaded servers from the cache
    #[command(name = "clear-cache")]
    ClearCache {
        /// Only remove this version
        #[arg(long)]
        version: Option<String>,
    },
    /// Show platform and cache information
    Status {
        /// Version to inspect
        #[arg(long)]
        version: Option<String>,
        /// Platform token to inspect
        #[arg(long, value_name = "TOKEN")]
        platform: Option<String>,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Client transport understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Transport {
    /// MCP over the process's stdin/stdout
    #[default]
    Stdio,
    /// MCP over HTTP on `--port`
    #[value(name = "streamableHttp")]
    StreamableHttp,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::StreamableHttp => "streamableHttp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server version to use: explicit choice, else the wrapper's own version.
pub fn server_version(explicit: Option<&str>) -> String {
    explicit
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(
            || WRAPPER_VERSION.trim_start_matches('v').to_string(),
            ToString::to_string,
        )
}

/// The user pressed Ctrl-C before the server started.
#[derive(Debug, Error)]
#[error("Interrupted")]
pub struct Interrupted;

/// Process exit status for an error bubbling out of a command.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.is::<Interrupted>() {
        return launch::EXIT_INTERRUPTED;
    }
    err.chain()
        .find_map(|e| e.downcast_ref::<AcquireError>())
        .map_or(1, AcquireError::exit_code)
}
