mod config;
mod date;
mod error;
mod util;
mod mem;

mod ndjson;
mod progress;
mod schema;
mod normalize;
mod store;

mod counting;
mod peak_days;
mod emoji;
mod mentions;

mod instrument;
mod pipeline;

pub use crate::config::AnalyticsOptions;
pub use crate::date::TweetDate;
pub use crate::error::{AnalyticsError, Result};
pub use crate::pipeline::TweetAnalytics;
pub use crate::normalize::NormalizeOutcome;

// Query results and the emoji scan strategy.
pub use crate::peak_days::PeakDay;
pub use crate::emoji::{is_emoji, EmojiCount, EmojiStrategy, EmojiTally};
pub use crate::mentions::{MentionCount, MentionExtractor, MentionTally};

// Expose the store so callers can inspect or scan normalized output directly.
pub use crate::store::{PostBatch, PostBatches, PostColumn, PostStore};
pub use crate::schema::create_post_schema;

// Ranking primitives.
pub use crate::counting::{FrequencyTable, Tally, TieBreak};

// Instrumentation hooks.
pub use crate::instrument::{MemoryHook, MemorySample, QueryHook, QueryKind, QueryReport, ScanStats, TimingHook};

pub use crate::util::init_tracing_once;
