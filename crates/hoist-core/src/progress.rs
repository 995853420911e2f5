//! Per-file progress reporting.
//!
//! Each in-flight file owns its own tracker; the shared rendering
//! surface behind [`MultiReporter`] is serialized by indicatif, so
//! concurrent updates from worker threads never interleave.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Hands out one tracker per file. Implementations must tolerate
/// trackers being driven from multiple worker threads at once.
pub trait Reporter: Send + Sync {
    fn tracker(&self, file_name: &str, total_bytes: u64) -> Box<dyn Tracker>;
}

/// Progress-accumulation handle for a single file. Reported positions
/// are clamped monotonically non-decreasing; `finish` must be called
/// exactly once, on success or failure.
pub trait Tracker: Send {
    /// Record the cumulative number of bytes transferred so far.
    fn update(&mut self, transferred_bytes: u64);
    fn finish(&mut self);
}

/// Terminal reporter backed by an `indicatif` multi-bar: one bar per
/// in-flight file, with byte counts rendered in binary units so
/// multi-gigabyte files stay readable.
pub struct MultiReporter {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl MultiReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template(
            "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({percent:>3}%)",
        )
        .expect("progress template is valid")
        .progress_chars("=> ");
        Self {
            multi: MultiProgress::new(),
            style,
        }
    }
}

impl Default for MultiReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for MultiReporter {
    fn tracker(&self, file_name: &str, total_bytes: u64) -> Box<dyn Tracker> {
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(self.style.clone());
        bar.set_message(file_name.to_string());
        Box::new(BarTracker {
            bar,
            last: 0,
            finished: false,
        })
    }
}

struct BarTracker {
    bar: ProgressBar,
    last: u64,
    finished: bool,
}

impl Tracker for BarTracker {
    fn update(&mut self, transferred_bytes: u64) {
        // Never move backwards, whatever the callback reports
        if transferred_bytes > self.last {
            self.last = transferred_bytes;
            self.bar.set_position(self.last);
        }
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.bar.finish_and_clear();
        }
    }
}

impl Drop for BarTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Reporter that discards all updates. Used in quiet mode and tests.
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn tracker(&self, _file_name: &str, _total_bytes: u64) -> Box<dyn Tracker> {
        Box::new(NoopTracker)
    }
}

struct NoopTracker;

impl Tracker for NoopTracker {
    fn update(&mut self, _transferred_bytes: u64) {}
    fn finish(&mut self) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_tracker_is_monotonic() {
        const GIB: u64 = 1 << 30;
        let reporter = MultiReporter::new();
        let mut tracker = reporter.tracker("big.iso", GIB);
        tracker.update(0);
        tracker.update(512 * 1024 * 1024);
        // A stale callback must not rewind the bar
        tracker.update(256 * 1024 * 1024);
        tracker.update(GIB);
        tracker.finish();
        // Second finish is a no-op
        tracker.finish();
    }

    #[test]
    fn drop_finishes_unfinished_tracker() {
        let reporter = MultiReporter::new();
        let tracker = reporter.tracker("partial.bin", 100);
        drop(tracker);
    }
}
