//! Rewrites the wrapper's flags into the server's flag vocabulary.
//!
//! The server wants `--client-transport=<mode>`, `--port=<n>` and
//! `--plugin-timeout=<ms>`, always in `--key=value` form and each exactly
//! once. Arguments given after `--` are forwarded in order; if they set one
//! of these flags themselves (under either the wrapper or the server name)
//! that value replaces the wrapper's.

use crate::Transport;

/// Flags the server understands, in the order they are emitted.
const SERVER_FLAGS: [&str; 3] = ["--client-transport", "--port", "--plugin-timeout"];

/// Map a wrapper-facing flag name onto its slot in [`SERVER_FLAGS`].
fn slot(name: &str) -> Option<usize> {
    match name {
        "--transport" | "--client-transport" => Some(0),
        "--port" => Some(1),
        "--plugin-timeout" => Some(2),
        _ => None,
    }
}

/// Settings the wrapper translates for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerFlags {
    pub transport: Transport,
    pub port: u16,
    pub plugin_timeout: u64,
}

impl ServerFlags {
    /// Full argument list for the server process.
    pub fn to_args(&self, passthrough: &[String]) -> Vec<String> {
        let mut values = [
            self.transport.to_string(),
            self.port.to_string(),
            self.plugin_timeout.to_string(),
        ];
        let mut rest = Vec::with_capacity(passthrough.len());

        let mut iter = passthrough.iter().peekable();
        while let Some(arg) = iter.next() {
            let inline = arg
                .split_once('=')
                .and_then(|(name, value)| slot(name).map(|i| (i, value)));
            if let Some((i, value)) = inline {
                values[i] = value.to_string();
                continue;
            }

            if let Some(i) = slot(arg) {
                if let Some(value) = iter.next_if(|v| !v.starts_with("--")) {
                    values[i] = value.clone();
                    continue;
                }
                tracing::warn!(flag = %arg, "flag without a value, ignoring");
                continue;
            }

            rest.push(arg.clone());
        }

        let mut args: Vec<String> = SERVER_FLAGS
            .iter()
            .zip(values)
            .map(|(flag, value)| format!("{flag}={value}"))
            .collect();
        args.extend(rest);
        args
    }
}
