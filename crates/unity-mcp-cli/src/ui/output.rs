//! Status output handle.
//!
//! Commands and the acquisition pipeline report through a cloneable
//! [`Output`]. Lines are written to stderr; on a terminal the download
//! progress redraws in place.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossterm::style::{Color, Stylize};
use crossterm::{cursor, queue, terminal};
use unity_mcp_core::Reporter;

use super::progress::{format_download_progress, percent};
use super::theme::{Theme, format_size};

const NO_PROGRESS: u64 = u64::MAX;

/// A cloneable handle for user-facing status lines.
#[derive(Debug, Clone)]
pub struct Output {
    theme: Theme,
    quiet: bool,
    interactive: bool,
    last_percent: Arc<AtomicU64>,
    progress_drawn: Arc<AtomicBool>,
}

impl Output {
    /// Output handle for stderr.
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            quiet: false,
            interactive: io::stderr().is_terminal(),
            last_percent: Arc::new(AtomicU64::new(NO_PROGRESS)),
            progress_drawn: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that only prints errors.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::new()
        }
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.info, self.theme.colors.secondary, msg);
        }
    }

    /// Log a success message.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.success, self.theme.colors.success, msg);
        }
    }

    /// Log a warning message.
    pub fn warning(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.warning, self.theme.colors.warning, msg);
        }
    }

    /// Log an error message. Printed even when quiet.
    pub fn error(&self, msg: &str) {
        self.line(self.theme.icons.error, self.theme.colors.error, msg);
    }

    fn line(&self, icon: &str, color: Color, msg: &str) {
        let mut err = io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = writeln!(err, "{} {msg}", icon.with(color));
    }

    fn clear_progress(&self, err: &mut impl Write) {
        if self.progress_drawn.swap(false, Ordering::Relaxed) {
            let _ = queue!(
                err,
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for Output {
    fn downloading(&self, asset: &str, current: u64, total: Option<u64>) {
        if self.quiet {
            return;
        }

        if !self.interactive {
            if current == 0 {
                let size = total.map_or_else(String::new, |t| format!(" ({})", format_size(t)));
                self.info(&format!("Downloading {asset}{size}"));
            }
            return;
        }

        // Redraw only when the whole percentage moves.
        let pct = percent(current, total).unwrap_or(current >> 20);
        if self.last_percent.swap(pct, Ordering::Relaxed) == pct && current != 0 {
            return;
        }

        let mut err = io::stderr().lock();
        let _ = queue!(
            err,
            cursor::MoveToColumn(0),
            terminal::Clear(terminal::ClearType::CurrentLine)
        );
        let _ = write!(
            err,
            "{} {} {}",
            self.theme.icons.active.with(self.theme.colors.active),
            asset.with(self.theme.colors.highlight),
            format_download_progress(current, total)
        );
        let _ = err.flush();
        self.progress_drawn.store(true, Ordering::Relaxed);
    }

    fn extracting(&self, asset: &str) {
        self.last_percent.store(NO_PROGRESS, Ordering::Relaxed);
        self.info(&format!("Extracting {asset}"));
    }

    fn done(&self, asset: &str, detail: &str) {
        self.success(&format!("{asset} ready at {detail}"));
    }

    fn failed(&self, asset: &str, reason: &str) {
        self.error(&format!("{asset}: {reason}"));
    }

    fn info(&self, msg: &str) {
        Output::info(self, msg);
    }
}
