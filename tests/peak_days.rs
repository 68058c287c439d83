#[path = "common/mod.rs"]
mod common;

use common::*;
use std::collections::HashMap;
use twetl::{AnalyticsError, TweetDate};

fn day(s: &str) -> TweetDate {
    s.parse().unwrap()
}

/// The three-post corpus: 2021-01-01 has two posts (alice and bob, one each),
/// 2021-01-02 has one (carol).
/// Outcome: both days are returned, the busier day first; the one-one tie on
/// 2021-01-01 goes to bob, whose post comes later.
#[test]
fn scenario_days_and_top_users() {
    let fx = scenario_store();
    let days = quiet().peak_days(&fx.store).unwrap();

    let pairs: Vec<_> = days.iter().map(|d| d.pair()).collect();
    assert_eq!(pairs, vec![(day("2021-01-01"), Some("bob")), (day("2021-01-02"), Some("carol"))]);
    assert_eq!(days[0].day_total, 2);
    assert_eq!(days[1].day_total, 1);
}

/// Twelve days where day `d` has `d` posts by a lead author plus one post by a
/// bystander. Only the ten busiest days survive, ordered by the lead's count.
#[test]
fn keeps_ten_busiest_days() {
    let mut rows = Vec::new();
    let dates: Vec<String> = (1..=12).map(|d| format!("2021-02-{:02}T09:00:00+00:00", d)).collect();
    let leads: Vec<String> = (1..=12).map(|d| format!("lead{}", d)).collect();
    for d in 0..12 {
        rows.push((dates[d].as_str(), "bystander", Some("hello")));
        for _ in 0..=d {
            rows.push((dates[d].as_str(), leads[d].as_str(), Some("post")));
        }
    }
    let fx = store_from_rows(&rows);
    let days = quiet().peak_days(&fx.store).unwrap();

    assert_eq!(days.len(), 10);
    for (i, peak) in days.iter().enumerate() {
        let d = 12 - i;
        assert_eq!(peak.date, day(&format!("2021-02-{:02}", d)));
        assert_eq!(peak.username, Some(format!("lead{}", d)));
        assert_eq!(peak.posts, d as u64);
        assert_eq!(peak.day_total, d as u64 + 1);
    }
}

/// Fewer distinct days than the cutoff: every day is reported.
#[test]
fn fewer_days_than_cutoff() {
    let fx = store_from_rows(&[
        ("2021-02-20T01:00:00+00:00", "a", None),
        ("2021-02-21T01:00:00+00:00", "b", None),
        ("2021-02-21T02:00:00+00:00", "b", None),
        ("2021-02-22T01:00:00+00:00", "c", Some("x")),
    ]);
    let days = quiet().peak_days(&fx.store).unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0].pair(), (day("2021-02-21"), Some("b")));
    // Equal winner counts and equal day totals: earlier day first.
    assert_eq!(days[1].pair(), (day("2021-02-20"), Some("a")));
    assert_eq!(days[2].pair(), (day("2021-02-22"), Some("c")));
}

/// The calendar day is the first ten characters of the timestamp; offsets are
/// not applied, so a late-evening post at -05:00 stays on its local day.
#[test]
fn day_is_timestamp_prefix_without_timezone_shift() {
    let fx = store_from_rows(&[
        ("2021-02-24T23:59:59-05:00", "night_owl", Some("late")),
        ("2021-02-24T23:30:00-05:00", "night_owl", Some("later")),
        ("2021-02-25T00:00:01+09:00", "early_bird", Some("early")),
    ]);
    let days = quiet().peak_days(&fx.store).unwrap();
    assert_eq!(days[0].pair(), (day("2021-02-24"), Some("night_owl")));
    assert_eq!(days[1].pair(), (day("2021-02-25"), Some("early_bird")));
}

/// Equal per-author counts within a day go to the author whose most recent
/// post that day appears later in the store.
#[test]
fn per_day_tie_goes_to_latest_poster() {
    let fx = store_from_rows(&[
        ("2021-02-14T01:00:00+00:00", "bob", None),
        ("2021-02-14T02:00:00+00:00", "alice", None),
        ("2021-02-14T03:00:00+00:00", "alice", None),
        ("2021-02-14T04:00:00+00:00", "bob", None),
    ]);
    let days = quiet().peak_days(&fx.store).unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].pair(), (day("2021-02-14"), Some("bob")));
    assert_eq!(days[0].posts, 2);
}

/// Rows with a missing or unparseable date are left out of the ranking.
#[test]
fn undated_rows_are_ignored() {
    let fx = store_from_lines(&[
        post_line(1, "2021-02-03T00:00:00+00:00", "alice", None),
        post_line(2, "not a date", "mallory", None),
        post_line(3, "2021", "mallory", None),
        r#"{"user": {"username": "mallory"}, "content": "no date at all"}"#.to_string(),
    ]);
    let days = quiet().peak_days(&fx.store).unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].pair(), (day("2021-02-03"), Some("alice")));
}

/// Property check over a pseudo-random corpus: the reported days are the ten
/// busiest, and each reported user has the maximal post count on that day.
#[test]
fn winners_are_daily_maxima_over_random_corpus() {
    let mut rng = Lcg(0x5eed);
    let users: Vec<String> = (0..9).map(|i| format!("user{}", i)).collect();
    let mut rows = Vec::new();
    let mut dates = Vec::new();
    for _ in 0..600 {
        let d = rng.next_below(15) + 1;
        let u = rng.next_below(users.len() as u64) as usize;
        dates.push((format!("2021-03-{:02}T12:00:00+00:00", d), u));
    }
    for (date, u) in &dates {
        rows.push((date.as_str(), users[*u].as_str(), Some("x")));
    }
    let fx = store_from_rows(&rows);
    let days = quiet().peak_days(&fx.store).unwrap();

    let mut per_day: HashMap<String, u64> = HashMap::new();
    let mut per_user: HashMap<(String, String), u64> = HashMap::new();
    for (date, user, _) in &rows {
        *per_day.entry(date[..10].to_string()).or_default() += 1;
        *per_user.entry((date[..10].to_string(), user.to_string())).or_default() += 1;
    }
    let mut totals: Vec<u64> = per_day.values().copied().collect();
    totals.sort_unstable_by(|a, b| b.cmp(a));
    let cutoff = totals[9];

    assert_eq!(days.len(), 10);
    for peak in &days {
        let key = peak.date.to_string();
        assert_eq!(per_day[&key], peak.day_total);
        assert!(peak.day_total >= cutoff, "{key} has {} posts, below cutoff {cutoff}", peak.day_total);
        let username = peak.username.clone().unwrap();
        let best = per_user.iter().filter(|((d, _), _)| *d == key).map(|(_, c)| *c).max().unwrap();
        assert_eq!(per_user[&(key.clone(), username)], best);
        assert_eq!(peak.posts, best);
    }
    for pair in days.windows(2) {
        assert!(pair[0].posts >= pair[1].posts);
    }
}

/// A store with zero rows yields an empty ranking, not an error.
#[test]
fn empty_store_yields_empty_ranking() {
    let fx = store_from_lines(&[]);
    assert!(quiet().peak_days(&fx.store).unwrap().is_empty());
}

/// A store path that does not exist fails up front.
#[test]
fn missing_store_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err = quiet().peak_days(&dir.path().join("none.parquet")).unwrap_err();
    assert!(matches!(err, AnalyticsError::StoreUnavailable { .. }), "got {err:?}");
}

/// Posts without a username are grouped together and can win their day, so a
/// day posted to only by unnamed accounts still gets its entry.
#[test]
fn unnamed_posts_form_their_own_group() {
    let anon = |date: &str| format!(r#"{{"date": "{date}", "user": null, "content": "anon"}}"#);
    let fx = store_from_lines(&[
        post_line(1, "2021-02-05T01:00:00+00:00", "alice", None),
        anon("2021-02-05T02:00:00+00:00"),
        anon("2021-02-05T03:00:00+00:00"),
        post_line(4, "2021-02-06T01:00:00+00:00", "bob", None),
        anon("2021-02-07T01:00:00+00:00"),
    ]);
    let days = quiet().peak_days(&fx.store).unwrap();

    assert_eq!(days.len(), 3);
    assert_eq!(days[0].pair(), (day("2021-02-05"), None));
    assert_eq!((days[0].posts, days[0].day_total), (2, 3));
    assert_eq!(days[1].pair(), (day("2021-02-06"), Some("bob")));
    assert_eq!(days[2].pair(), (day("2021-02-07"), None));
}
