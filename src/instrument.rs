//! Optional observation of normalization and query runs.
//!
//! Callers attach hooks to `TweetAnalytics`; the aggregation code itself only
//! fills a [`ScanStats`] and never sees the hooks.

use crate::mem::process_rss_bytes;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Which operation a hook is observing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Normalize,
    PeakDays,
    TopEmojis(crate::emoji::EmojiStrategy),
    TopMentions,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Normalize => f.write_str("normalize"),
            QueryKind::PeakDays => f.write_str("peak_days"),
            QueryKind::TopEmojis(s) => write!(f, "top_emojis[{s}]"),
            QueryKind::TopMentions => f.write_str("top_mentions"),
        }
    }
}

/// Row accounting filled in by the scan loops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Rows read from the store or source.
    pub rows_scanned: u64,
    /// Largest number of rows held in memory at once.
    pub peak_rows_resident: u64,
}

impl ScanStats {
    pub(crate) fn scanned(&mut self, rows: u64) {
        self.rows_scanned += rows;
    }

    pub(crate) fn resident(&mut self, rows: u64) {
        self.peak_rows_resident = self.peak_rows_resident.max(rows);
    }
}

/// What a finished operation reports to hooks.
#[derive(Clone, Debug, Serialize)]
pub struct QueryReport {
    pub elapsed: Duration,
    pub stats: ScanStats,
    /// Number of result tuples (rows written, for normalization).
    pub results: usize,
    pub succeeded: bool,
}

pub trait QueryHook: Send + Sync {
    fn on_start(&self, _kind: QueryKind) {}
    fn on_finish(&self, _kind: QueryKind, _report: &QueryReport) {}
}

/// Logs wall-clock duration of every operation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimingHook;

impl QueryHook for TimingHook {
    fn on_start(&self, kind: QueryKind) {
        tracing::debug!(%kind, "started");
    }

    fn on_finish(&self, kind: QueryKind, report: &QueryReport) {
        tracing::info!(
            %kind,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            rows = report.stats.rows_scanned,
            results = report.results,
            ok = report.succeeded,
            "finished in {:.3}s",
            report.elapsed.as_secs_f64()
        );
    }
}

/// One memory reading around an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MemorySample {
    pub kind: QueryKind,
    pub rss_before: u64,
    pub rss_after: u64,
    pub peak_rows_resident: u64,
}

impl MemorySample {
    pub fn rss_delta(&self) -> i64 {
        self.rss_after as i64 - self.rss_before as i64
    }
}

/// Samples process RSS before and after each operation and keeps the readings.
#[derive(Debug, Default)]
pub struct MemoryHook {
    pending: Mutex<Option<u64>>,
    samples: Mutex<Vec<MemorySample>>,
}

impl MemoryHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<MemorySample> {
        self.samples.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl QueryHook for MemoryHook {
    fn on_start(&self, _kind: QueryKind) {
        if let Ok(mut p) = self.pending.lock() {
            *p = process_rss_bytes();
        }
    }

    fn on_finish(&self, kind: QueryKind, report: &QueryReport) {
        let before = self.pending.lock().ok().and_then(|mut p| p.take()).unwrap_or(0);
        let after = process_rss_bytes().unwrap_or(0);
        let sample = MemorySample {
            kind,
            rss_before: before,
            rss_after: after,
            peak_rows_resident: report.stats.peak_rows_resident,
        };
        tracing::info!(
            %kind,
            rss_before_mib = before as f64 / (1024.0 * 1024.0),
            rss_after_mib = after as f64 / (1024.0 * 1024.0),
            peak_rows_resident = sample.peak_rows_resident,
            "memory"
        );
        if let Ok(mut s) = self.samples.lock() {
            s.push(sample);
        }
    }
}
