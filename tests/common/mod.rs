#![allow(dead_code)]

use serde_json::json;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use twetl::{QueryHook, QueryKind, QueryReport, TweetAnalytics};

/// One JSONL record shaped like the farmers-protest export: the fields the
/// queries read (`date`, `content`, `user.username`) plus a few passengers.
pub fn post_line(id: u64, date: &str, username: &str, content: Option<&str>) -> String {
    json!({
        "url": format!("https://twitter.com/{}/status/{}", username, id),
        "date": date,
        "content": content,
        "renderedContent": content,
        "id": id,
        "user": {
            "username": username,
            "displayname": username.to_uppercase(),
            "id": 1000 + id,
            "followersCount": 42,
            "verified": false
        },
        "replyCount": 0,
        "retweetCount": 3,
        "lang": "en",
        "quotedTweet": null
    })
    .to_string()
}

/// Write lines verbatim, each followed by `\n`.
pub fn write_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Write a compressed `.zst` JSONL source.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Builder with progress bars off, as every test wants.
pub fn quiet() -> TweetAnalytics {
    TweetAnalytics::new().progress(false)
}

/// A normalized store in a scratch directory. Keep the fixture alive for as
/// long as the paths are used.
pub struct Fixture {
    pub dir: TempDir,
    pub source: PathBuf,
    pub store: PathBuf,
}

/// Normalize `(date, username, content)` rows (in order) into a fresh store.
pub fn store_from_rows(rows: &[(&str, &str, Option<&str>)]) -> Fixture {
    let lines: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, (date, user, content))| post_line(i as u64 + 1, date, user, *content))
        .collect();
    store_from_lines(&lines)
}

pub fn store_from_lines(lines: &[String]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("data").join("tweets.json");
    let store = dir.path().join("data").join("tweets.parquet");
    write_lines(&source, lines);
    quiet().normalize(&source, &store).unwrap();
    Fixture { dir, source, store }
}

/// The three-post corpus:
///   2021-01-01 alice "hi @bob 😀"
///   2021-01-01 bob   "yo 😀😀"
///   2021-01-02 carol "@bob hi"
pub fn scenario_store() -> Fixture {
    store_from_rows(&[
        ("2021-01-01T10:00:00+00:00", "alice", Some("hi @bob 😀")),
        ("2021-01-01T11:30:00+00:00", "bob", Some("yo 😀😀")),
        ("2021-01-02T08:15:00+00:00", "carol", Some("@bob hi")),
    ])
}

/// Deterministic pseudo-random sequence (64-bit LCG) for property-style corpora.
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next_below(&mut self, n: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 33) % n
    }
}

/// Hook that keeps every start/finish it observes.
#[derive(Default)]
pub struct RecordingHook {
    pub started: Mutex<Vec<QueryKind>>,
    pub finished: Mutex<Vec<(QueryKind, QueryReport)>>,
}

impl RecordingHook {
    pub fn last_report(&self) -> QueryReport {
        self.finished.lock().unwrap().last().unwrap().1.clone()
    }
}

impl QueryHook for RecordingHook {
    fn on_start(&self, kind: QueryKind) {
        self.started.lock().unwrap().push(kind);
    }
    fn on_finish(&self, kind: QueryKind, report: &QueryReport) {
        self.finished.lock().unwrap().push((kind, report.clone()));
    }
}
