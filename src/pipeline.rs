use crate::config::AnalyticsOptions;
use crate::emoji::{top_emojis, EmojiCount, EmojiStrategy};
use crate::error::Result;
use crate::instrument::{QueryHook, QueryKind, QueryReport, ScanStats};
use crate::mentions::{top_mentions, MentionCount};
use crate::normalize::{normalize_jsonl, NormalizeOutcome};
use crate::peak_days::{peak_days, PeakDay};
use crate::progress::ProgressScope;
use crate::store::PostStore;
use crate::util::init_tracing_once;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Entry point: options, hooks, and the four operations.
///
/// Every operation takes its paths explicitly and opens its own store handle,
/// so one builder can run any number of independent calls.
#[derive(Clone, Default)]
pub struct TweetAnalytics {
    pub(crate) opts: AnalyticsOptions,
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl TweetAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    // -------- Builder methods --------
    pub fn top_k(mut self, k: usize) -> Self { self.opts = self.opts.with_top_k(k); self }
    pub fn batch_size(mut self, rows: usize) -> Self { self.opts = self.opts.with_batch_size(rows); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn options(mut self, opts: AnalyticsOptions) -> Self { self.opts = opts; self }

    /// Attach an instrumentation hook; hooks run in the order they were added.
    pub fn hook(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn opts(&self) -> &AnalyticsOptions {
        &self.opts
    }

    // -------- Operations --------

    /// Convert a line-delimited JSON export into a Parquet post store.
    /// A no-op when `target` already exists.
    pub fn normalize(&self, source: &Path, target: &Path) -> Result<NormalizeOutcome> {
        self.observe(QueryKind::Normalize, |stats| {
            let outcome = normalize_jsonl(source, target, &self.opts, stats)?;
            let rows = outcome.rows_written() as usize;
            Ok((outcome, rows))
        })
    }

    /// Top days by post count, each with its most active author.
    pub fn peak_days(&self, store: &Path) -> Result<Vec<PeakDay>> {
        self.run_query(QueryKind::PeakDays, store, 2, |store, progress, stats| {
            peak_days(store, self.opts.top_k, self.opts.batch_size, progress, stats)
        })
    }

    /// Most frequent emoji characters in post text.
    pub fn top_emojis(&self, store: &Path, strategy: EmojiStrategy) -> Result<Vec<EmojiCount>> {
        self.run_query(QueryKind::TopEmojis(strategy), store, 1, |store, progress, stats| {
            top_emojis(store, strategy, self.opts.top_k, self.opts.batch_size, progress, stats)
        })
    }

    /// Most frequently @-mentioned handles.
    pub fn top_mentions(&self, store: &Path) -> Result<Vec<MentionCount>> {
        self.run_query(QueryKind::TopMentions, store, 1, |store, progress, stats| {
            top_mentions(store, self.opts.top_k, self.opts.batch_size, progress, stats)
        })
    }

    /// Open the store, set up a row progress bar covering `passes` full scans, run `f`.
    fn run_query<T>(
        &self,
        kind: QueryKind,
        store: &Path,
        passes: u64,
        f: impl FnOnce(&PostStore, &ProgressScope, &mut ScanStats) -> Result<Vec<T>>,
    ) -> Result<Vec<T>> {
        self.observe(kind, |stats| {
            let store = PostStore::open(store)?;
            let label = self.opts.label_for(&kind.to_string());
            let progress = ProgressScope::rows(self.opts.progress, &label, store.num_rows() * passes);
            let out = f(&store, &progress, stats)?;
            progress.finish(&format!("{kind}: {} results", out.len()));
            let n = out.len();
            Ok((out, n))
        })
    }

    /// Time `f`, and report start/finish to every hook, failures included.
    fn observe<T>(&self, kind: QueryKind, f: impl FnOnce(&mut ScanStats) -> Result<(T, usize)>) -> Result<T> {
        init_tracing_once();
        for h in &self.hooks {
            h.on_start(kind);
        }
        let started = Instant::now();
        let mut stats = ScanStats::default();
        let res = f(&mut stats);
        let report = QueryReport {
            elapsed: started.elapsed(),
            stats,
            results: res.as_ref().map(|(_, n)| *n).unwrap_or(0),
            succeeded: res.is_ok(),
        };
        for h in &self.hooks {
            h.on_finish(kind, &report);
        }
        match res {
            Ok((out, _)) => Ok(out),
            Err(e) => {
                tracing::error!(%kind, "failed: {}", e);
                Err(e)
            }
        }
    }
}
