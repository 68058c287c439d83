use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar day of a post ("YYYY-MM-DD"), taken verbatim from the timestamp prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweetDate(Date);

impl TweetDate {
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Truncate an ISO-8601 timestamp to its first 10 characters and parse the day.
    /// No timezone conversion is applied: "2021-02-24T23:59:59+00:00" is 2021-02-24.
    pub fn from_timestamp_prefix(ts: &str) -> Option<Self> {
        let prefix = ts.get(..10)?;
        Date::parse(prefix, DAY_FORMAT).ok().map(Self)
    }

    pub fn as_date(self) -> Date {
        self.0
    }
}

impl fmt::Display for TweetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.format(DAY_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl FromStr for TweetDate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
    }
}

impl Serialize for TweetDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
