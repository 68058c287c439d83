//! Emoji frequency ranking over post text.
//!
//! The text can be pulled from the store two ways (see [`EmojiStrategy`]); both
//! feed the same [`EmojiTally`], so the resulting ranking is the same whichever
//! strategy ran.

use crate::counting::{FrequencyTable, TieBreak};
use crate::error::Result;
use crate::instrument::ScanStats;
use crate::progress::ProgressScope;
use crate::store::{PostColumn, PostStore};
use arrow::array::{Array, AsArray};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How post text is read for emoji counting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmojiStrategy {
    /// Materialize the whole `content` column, then scan it. Fastest; memory
    /// grows with total text volume.
    #[default]
    Bulk,
    /// Walk the store one row at a time. Memory stays at one row plus the tally.
    Streaming,
}

impl EmojiStrategy {
    fn scanner(self, batch_size: usize) -> Box<dyn TextScan> {
        match self {
            EmojiStrategy::Bulk => Box::new(BulkScan { batch_size }),
            EmojiStrategy::Streaming => Box::new(StreamingScan),
        }
    }
}

impl fmt::Display for EmojiStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EmojiStrategy::Bulk => "bulk",
            EmojiStrategy::Streaming => "streaming",
        })
    }
}

impl FromStr for EmojiStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bulk" | "time" => Ok(EmojiStrategy::Bulk),
            "streaming" | "stream" | "memory" => Ok(EmojiStrategy::Streaming),
            other => Err(format!("unknown emoji strategy '{other}' (expected bulk|streaming)")),
        }
    }
}

/// A ranked emoji and how many times it occurred.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmojiCount {
    pub emoji: char,
    pub count: u64,
}

/// Emoji_Component code points. The `emojis` table only lists them inside
/// sequences, but each one has the Unicode `Emoji` property on its own.
const COMPONENT_RANGES: &[(char, char)] = &[
    ('\u{1F1E6}', '\u{1F1FF}'), // regional indicators
    ('\u{1F3FB}', '\u{1F3FF}'), // skin tone modifiers
    ('\u{1F9B0}', '\u{1F9B3}'), // hair components
];

/// True when `c` on its own is an emoji character: a standalone entry in the
/// Unicode emoji data shipped by the `emojis` crate (fully qualified or in its
/// text-presentation form), or an emoji component. ASCII never qualifies:
/// keycaps need a combining mark.
pub fn is_emoji(c: char) -> bool {
    if c.is_ascii() {
        return false;
    }
    if COMPONENT_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c)) {
        return true;
    }
    let mut buf = [0u8; 8];
    let len = c.encode_utf8(&mut buf).len();
    // Text-default symbols (U+263A and friends) are listed with U+FE0F.
    let len_qualified = len + '\u{FE0F}'.encode_utf8(&mut buf[len..]).len();
    let lookup = |n: usize| std::str::from_utf8(&buf[..n]).map_or(false, |s| emojis::get(s).is_some());
    lookup(len) || lookup(len_qualified)
}

/// Emoji occurrence counter; ties rank by first occurrence.
#[derive(Clone, Debug, Default)]
pub struct EmojiTally {
    table: FrequencyTable<char>,
}

impl EmojiTally {
    pub fn ingest(&mut self, text: &str) {
        for c in text.chars().filter(|&c| is_emoji(c)) {
            self.table.add(c);
        }
    }

    pub fn top(&self, k: usize) -> Vec<EmojiCount> {
        self.table
            .top_k(k, TieBreak::FirstSeen)
            .into_iter()
            .map(|(emoji, count)| EmojiCount { emoji, count })
            .collect()
    }
}

/// Source of non-null post text, in store order.
trait TextScan {
    fn scan(&self, store: &PostStore, stats: &mut ScanStats, progress: &ProgressScope, visit: &mut dyn FnMut(&str))
        -> Result<()>;
}

/// Reads every batch of `content`, concatenates them into one array, then scans.
struct BulkScan {
    batch_size: usize,
}

impl TextScan for BulkScan {
    fn scan(&self, store: &PostStore, stats: &mut ScanStats, progress: &ProgressScope, visit: &mut dyn FnMut(&str))
        -> Result<()> {
        let mut parts = Vec::new();
        for batch in store.batches(&[PostColumn::Content], self.batch_size)? {
            let batch = batch?;
            if let Some(content) = batch.content_array() {
                parts.push(content.clone());
            }
        }
        if parts.is_empty() {
            return Ok(());
        }
        let column = {
            let refs: Vec<&dyn Array> = parts.iter().map(|a| a as &dyn Array).collect();
            arrow::compute::concat(&refs)?
        };
        drop(parts);
        let column = column.as_string::<i32>();
        stats.resident(column.len() as u64);
        stats.scanned(column.len() as u64);

        for text in column.iter().flatten() {
            visit(text);
        }
        progress.inc(column.len() as u64);
        Ok(())
    }
}

/// Pulls one row at a time through the store's row cursor.
struct StreamingScan;

impl TextScan for StreamingScan {
    fn scan(&self, store: &PostStore, stats: &mut ScanStats, progress: &ProgressScope, visit: &mut dyn FnMut(&str))
        -> Result<()> {
        let mut since_tick = 0u64;
        let visited = store.for_each_content_row(|text| {
            stats.resident(1);
            if let Some(text) = text.filter(|t| !t.is_empty()) {
                visit(text);
            }
            since_tick += 1;
            if since_tick == 4096 {
                progress.inc(since_tick);
                since_tick = 0;
            }
            Ok(())
        })?;
        progress.inc(since_tick);
        stats.scanned(visited);
        Ok(())
    }
}

pub(crate) fn top_emojis(
    store: &PostStore,
    strategy: EmojiStrategy,
    k: usize,
    batch_size: usize,
    progress: &ProgressScope,
    stats: &mut ScanStats,
) -> Result<Vec<EmojiCount>> {
    let mut tally = EmojiTally::default();
    strategy.scanner(batch_size).scan(store, stats, progress, &mut |text| tally.ingest(text))?;
    Ok(tally.top(k))
}
