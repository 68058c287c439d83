//! `@handle` extraction and mention ranking.

use crate::counting::{FrequencyTable, TieBreak};
use crate::error::Result;
use crate::instrument::ScanStats;
use crate::progress::ProgressScope;
use crate::store::{PostColumn, PostStore};
use regex::Regex;
use serde::Serialize;

/// A mentioned handle (without the `@`) and how often it was mentioned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MentionCount {
    pub username: String,
    pub count: u64,
}

/// Finds `@` followed by one or more ASCII word characters.
#[derive(Clone, Debug)]
pub struct MentionExtractor {
    re: Regex,
}

impl Default for MentionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionExtractor {
    pub fn new() -> Self {
        // `\w` is Unicode-aware in `regex`; handles are ASCII only.
        let re = Regex::new(r"@([A-Za-z0-9_]+)").expect("static mention pattern");
        Self { re }
    }

    /// Handles mentioned in `text`, in order, with the leading `@` stripped.
    pub fn extract<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.re.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str())
    }
}

/// Mention counter; ties rank by handle, ascending.
#[derive(Clone, Debug, Default)]
pub struct MentionTally {
    extractor: MentionExtractor,
    table: FrequencyTable<String>,
}

impl MentionTally {
    pub fn ingest(&mut self, text: &str) {
        for handle in self.extractor.extract(text) {
            self.table.add_ref(handle);
        }
    }

    pub fn count(&self, handle: &str) -> u64 {
        self.table.get(handle)
    }

    pub fn top(&self, k: usize) -> Vec<MentionCount> {
        self.table
            .top_k(k, TieBreak::KeyAscending)
            .into_iter()
            .map(|(username, count)| MentionCount { username, count })
            .collect()
    }
}

pub(crate) fn top_mentions(
    store: &PostStore,
    k: usize,
    batch_size: usize,
    progress: &ProgressScope,
    stats: &mut ScanStats,
) -> Result<Vec<MentionCount>> {
    let mut tally = MentionTally::default();
    for batch in store.batches(&[PostColumn::Content], batch_size)? {
        let batch = batch?;
        stats.resident(batch.len() as u64);
        for i in 0..batch.len() {
            if let Some(text) = batch.content(i) {
                tally.ingest(text);
            }
        }
        stats.scanned(batch.len() as u64);
        progress.inc(batch.len() as u64);
    }
    Ok(tally.top(k))
}
