//! Shared vocabulary for the Unity MCP server wrapper: platform tokens and
//! release asset names. Pure functions only, no I/O.

pub mod asset;
pub mod platform;

// Re-exports
pub use asset::*;
pub use platform::*;
