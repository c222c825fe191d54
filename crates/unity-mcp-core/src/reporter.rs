//! Reporter trait for dependency injection
//!
//! Lets the acquisition pipeline report progress without being coupled to a
//! particular terminal UI. Implementations must not write to stdout: in stdio
//! transport mode stdout belongs to the launched server.

/// Sink for acquisition progress.
pub trait Reporter: Send + Sync {
    /// Updates the progress of an archive download.
    fn downloading(&self, asset: &str, current: u64, total: Option<u64>);

    /// Indicates the archive is being unpacked.
    fn extracting(&self, asset: &str);

    /// Marks the acquisition as successfully completed.
    fn done(&self, asset: &str, detail: &str);

    /// Marks the acquisition as failed with a specific reason.
    fn failed(&self, asset: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn downloading(&self, asset: &str, current: u64, total: Option<u64>) {
        (**self).downloading(asset, current, total);
    }
    fn extracting(&self, asset: &str) {
        (**self).extracting(asset);
    }
    fn done(&self, asset: &str, detail: &str) {
        (**self).done(asset, detail);
    }
    fn failed(&self, asset: &str, reason: &str) {
        (**self).failed(asset, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: &str) {}
    fn done(&self, _: &str, _: &str) {}
    fn failed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
}
