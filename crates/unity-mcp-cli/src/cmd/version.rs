//! Version command

use crate::WRAPPER_VERSION;

/// Print wrapper and server versions.
pub fn version(server_version: &str) {
    println!("unity-mcp version {WRAPPER_VERSION}");
    println!("Server version: {server_version}");
}
