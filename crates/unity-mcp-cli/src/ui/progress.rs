//! Download progress rendering.

use super::theme::format_size;

/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 24;

/// Progress line body: bar, percentage and total size, or the running byte
/// count when the server sent no length.
pub fn format_download_progress(current: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let pct = (current.saturating_mul(100) / total).min(100);
            let bar = format_progress_bar(current, total, BAR_WIDTH);
            format!("{bar}  {pct:>3}%  {}", format_size(total))
        }
        _ => format!("{} downloaded", format_size(current)),
    }
}

/// Format a progress bar using ▓ (filled) and ░ (empty).
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total > 0 {
        ((current.min(total) as f64 / total as f64) * width as f64).round() as usize
    } else {
        0
    };
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}

/// Whole percent complete, if the total is known.
pub fn percent(current: u64, total: Option<u64>) -> Option<u64> {
    total
        .filter(|t| *t > 0)
        .map(|t| (current.saturating_mul(100) / t).min(100))
}
