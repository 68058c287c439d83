//! Busiest days and the most active author on each of them.

use crate::counting::{top_k_by, FrequencyTable, TieBreak};
use crate::date::TweetDate;
use crate::error::Result;
use crate::instrument::ScanStats;
use crate::progress::ProgressScope;
use crate::store::{PostColumn, PostStore};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::cmp::Reverse;

/// One of the busiest days with its top author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PeakDay {
    pub date: TweetDate,
    /// `None` when the day's busiest group is posts without a username.
    pub username: Option<String>,
    /// Posts by `username` on `date`.
    pub posts: u64,
    /// All posts on `date`.
    pub day_total: u64,
}

impl PeakDay {
    pub fn pair(&self) -> (TweetDate, Option<&str>) {
        (self.date, self.username.as_deref())
    }
}

/// Stage 1: posts per day over the whole store, best `k` days.
/// Equal counts keep the earlier day.
fn busiest_days(
    store: &PostStore,
    k: usize,
    batch_size: usize,
    progress: &ProgressScope,
    stats: &mut ScanStats,
) -> Result<Vec<(TweetDate, u64)>> {
    let mut per_day = FrequencyTable::<TweetDate>::new();
    let mut undated = 0u64;
    for batch in store.batches(&[PostColumn::Date], batch_size)? {
        let batch = batch?;
        stats.resident(batch.len() as u64);
        for i in 0..batch.len() {
            match batch.tweet_date(i) {
                Some(day) => per_day.add(day),
                None => undated += 1,
            }
        }
        stats.scanned(batch.len() as u64);
        progress.inc(batch.len() as u64);
    }
    if undated > 0 {
        tracing::warn!(rows = undated, "rows without a parseable date were left out of the day ranking");
    }
    Ok(per_day.top_k(k, TieBreak::KeyAscending))
}

/// Stage 2: per-author counts restricted to `days`, reduced to one winner per day.
/// Posts without a username form their own group, which can win its day.
/// Equal counts go to the author whose latest post that day comes later in the store.
fn top_author_per_day(
    store: &PostStore,
    days: &AHashSet<TweetDate>,
    batch_size: usize,
    progress: &ProgressScope,
    stats: &mut ScanStats,
) -> Result<AHashMap<TweetDate, (Option<String>, u64)>> {
    let mut per_author = FrequencyTable::<(TweetDate, Option<String>)>::new();
    for batch in store.batches(&[PostColumn::Date, PostColumn::Username], batch_size)? {
        let batch = batch?;
        stats.resident(batch.len() as u64);
        for i in 0..batch.len() {
            let Some(day) = batch.tweet_date(i).filter(|d| days.contains(d)) else { continue };
            per_author.add((day, batch.username(i).map(str::to_string)));
        }
        stats.scanned(batch.len() as u64);
        progress.inc(batch.len() as u64);
    }

    let mut by_day: AHashMap<TweetDate, Vec<(Option<String>, _)>> = AHashMap::new();
    for ((day, user), tally) in per_author.iter() {
        by_day.entry(*day).or_default().push((user.clone(), *tally));
    }
    Ok(by_day
        .into_iter()
        .filter_map(|(day, authors)| {
            let (user, tally) = top_k_by(authors, 1, TieBreak::LastSeen).into_iter().next()?;
            Some((day, (user, tally.count)))
        })
        .collect())
}

pub(crate) fn peak_days(
    store: &PostStore,
    k: usize,
    batch_size: usize,
    progress: &ProgressScope,
    stats: &mut ScanStats,
) -> Result<Vec<PeakDay>> {
    let days = busiest_days(store, k, batch_size, progress, stats)?;
    if days.is_empty() {
        return Ok(Vec::new());
    }
    let wanted: AHashSet<TweetDate> = days.iter().map(|(d, _)| *d).collect();
    let mut winners = top_author_per_day(store, &wanted, batch_size, progress, stats)?;

    let mut out: Vec<PeakDay> = days
        .into_iter()
        .filter_map(|(date, day_total)| {
            let (username, posts) = winners.remove(&date)?;
            Some(PeakDay { date, username, posts, day_total })
        })
        .collect();
    out.sort_by_key(|p| (Reverse(p.posts), Reverse(p.day_total), p.date));
    Ok(out)
}
