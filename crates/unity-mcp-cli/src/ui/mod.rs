//! Terminal output for the wrapper.
//!
//! Everything here writes to stderr. In stdio transport mode stdout is the
//! protocol channel of the server process and must stay clean.
//!
//! - [`theme`] - Colors, icons and size formatting
//! - [`progress`] - Download progress bar
//! - [`output`] - Handle used by commands and the acquisition pipeline

pub mod output;
pub mod progress;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
