//! unity-mcp - Unity MCP server launcher

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use unity_mcp_cli::cmd;
use unity_mcp_cli::translate::ServerFlags;
use unity_mcp_cli::ui::Output;
use unity_mcp_cli::{Cli, Commands, exit_code_for, server_version};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs share stderr with status output; stdout may be the MCP channel.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            let code = exit_code_for(&err);
            if code != unity_mcp_cli::launch::EXIT_INTERRUPTED {
                Output::new().error(&format!("{err:#}"));
            }
            code
        }
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn dispatch(cli: Cli) -> Result<i32> {
    let default_version = server_version(cli.server_version.as_deref());

    if cli.version {
        cmd::version::version(&default_version);
        return Ok(0);
    }

    match cli.command {
        None => {
            let flags = ServerFlags {
                transport: cli.transport,
                port: cli.port,
                plugin_timeout: cli.plugin_timeout,
            };
            cmd::run::run(&default_version, cli.platform.as_deref(), flags, &cli.args).await
        }
        Some(Commands::Download {
            version,
            platform,
            force,
        }) => {
            let version = version.unwrap_or(default_version);
            let platform = platform.or(cli.platform);
            cmd::download::download(&version, platform.as_deref(), force).await?;
            Ok(0)
        }
        Some(Commands::ClearCache { version }) => {
            cmd::clear_cache::clear_cache(version.as_deref())?;
            Ok(0)
        }
        Some(Commands::Status {
            version,
            platform,
            json,
        }) => {
            let version = version.unwrap_or(default_version);
            let platform = platform.or(cli.platform);
            cmd::status::status(&version, platform.as_deref(), json)?;
            Ok(0)
        }
        Some(Commands::Completions { shell }) => {
            cmd::completions::completions(shell);
            Ok(0)
        }
    }
}
