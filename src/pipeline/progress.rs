//! Progress tracking for ingestion runs

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta}) {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {pos} documents ({per_sec}) {msg}";

/// Atomic progress counters shared by the pipeline stages
///
/// Each counter has a single writing stage: `listed` the enumerator,
/// `fetched` the fetch tasks, `appended`, `committed` and `batches` the
/// indexer. `committed` only ever grows, and only after a commit succeeded.
pub struct IngestProgress {
    listed: AtomicU64,
    fetched: AtomicU64,
    appended: AtomicU64,
    committed: AtomicU64,
    batches: AtomicU64,
    bar: ProgressBar,
    started_at: Instant,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub listed: u64,
    pub fetched: u64,
    pub appended: u64,
    pub committed: u64,
    pub batches: u64,
}

impl IngestProgress {
    /// Counters without any terminal output
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    /// Counters drawing a bar on stderr
    ///
    /// With `expected` set the bar has a fixed length, otherwise a spinner
    /// counts appended documents.
    #[must_use]
    pub fn visible(expected: Option<u64>) -> Self {
        let bar = match expected {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    bar.set_style(style);
                }
                bar
            }
        };
        bar.enable_steady_tick(Duration::from_millis(200));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            listed: AtomicU64::new(0),
            fetched: AtomicU64::new(0),
            appended: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            bar,
            started_at: Instant::now(),
        }
    }

    #[inline]
    pub(crate) fn record_listed(&self) {
        self.listed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_appended(&self) {
        self.appended.fetch_add(1, Ordering::Relaxed);
        self.bar.inc(1);
    }

    pub(crate) fn record_commit(&self, documents: usize) {
        let committed = self
            .committed
            .fetch_add(documents as u64, Ordering::Release)
            + documents as u64;
        let batches = self.batches.fetch_add(1, Ordering::Relaxed) + 1;
        self.bar
            .set_message(format!("{committed} committed in {batches} batches"));
    }

    #[must_use]
    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            listed: self.listed.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            appended: self.appended.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Acquire),
            batches: self.batches.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn finish(&self, message: &'static str) {
        self.bar.finish_with_message(message);
    }

    pub(crate) fn abandon(&self, message: &'static str) {
        self.bar.abandon_with_message(message);
    }
}

impl Default for IngestProgress {
    fn default() -> Self {
        Self::hidden()
    }
}
