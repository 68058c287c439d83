//! Progress reporting: byte bars for source passes and row bars for store scans.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_CHARS: &str = "█▉▊▋▌▍▎▏  ";

fn styled(pb: ProgressBar, template: &str, label: &str) -> ProgressBar {
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars(BAR_CHARS));
    }
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Byte-style progress bar over a source file.
pub fn make_progress_bar_labeled(total_bytes: u64, label: &str) -> ProgressBar {
    styled(
        ProgressBar::new(total_bytes),
        "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
         {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
        label,
    )
}

/// Count-style progress bar (rows scanned out of total).
pub fn make_count_progress(total: u64, label: &str) -> ProgressBar {
    styled(
        ProgressBar::new(total),
        "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
         rows/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}",
        label,
    )
}

/// Optional bar: a thin wrapper so scan loops don't branch on `Option<ProgressBar>`.
pub struct ProgressScope {
    pb: Option<ProgressBar>,
}

impl ProgressScope {
    pub fn bytes(enabled: bool, label: &str, total_bytes: u64) -> Self {
        Self { pb: enabled.then(|| make_progress_bar_labeled(total_bytes, label)) }
    }
    pub fn rows(enabled: bool, label: &str, total_rows: u64) -> Self {
        Self { pb: enabled.then(|| make_count_progress(total_rows, label)) }
    }
    #[inline]
    pub fn inc(&self, delta: u64) {
        if let Some(pb) = &self.pb { pb.inc(delta); }
    }
    pub fn finish(&self, msg: &str) {
        if let Some(pb) = &self.pb { pb.finish_with_message(msg.to_string()); }
    }
}
