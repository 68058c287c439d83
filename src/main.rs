use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use twetl::{EmojiStrategy, MemoryHook, TimingHook, TweetAnalytics};

#[derive(Parser, Debug)]
#[command(name = "twetl", about = "Normalize a post export to Parquet and rank days, emojis and mentions")]
struct Args {
    /// Entries returned per ranking
    #[arg(long, global = true, default_value_t = 10)]
    top: usize,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Hide progress bars
    #[arg(long, global = true)]
    no_progress: bool,
    /// Log process memory before/after each operation
    #[arg(long, global = true)]
    profile_memory: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert line-delimited JSON into a Parquet post store (skipped if it exists)
    Normalize {
        /// Line-delimited JSON export (plain or `.zst`)
        source: PathBuf,
        /// Parquet store to create
        target: PathBuf,
    },
    /// Busiest days with their most active author
    PeakDays {
        /// Normalized Parquet store
        store: PathBuf,
    },
    /// Most used emojis
    Emojis {
        /// Normalized Parquet store
        store: PathBuf,
        /// bulk (whole column in memory) or streaming (row at a time)
        #[arg(long, default_value = "bulk")]
        strategy: EmojiStrategy,
    },
    /// Most mentioned usernames
    Mentions {
        /// Normalized Parquet store
        store: PathBuf,
    },
    /// Run all three rankings against one store
    All {
        /// Normalized Parquet store
        store: PathBuf,
        #[arg(long, default_value = "bulk")]
        strategy: EmojiStrategy,
    },
}

fn print_rows<T: serde::Serialize>(json: bool, title: &str, rows: &[T], line: impl Fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    println!("{title}");
    if rows.is_empty() {
        println!("  (no results)");
    }
    for (i, row) in rows.iter().enumerate() {
        println!("{:>3}. {}", i + 1, line(row));
    }
    Ok(())
}

fn main() -> Result<()> {
    twetl::init_tracing_once();
    let args = Args::parse();

    let mut analytics = TweetAnalytics::new()
        .top_k(args.top)
        .progress(!args.no_progress)
        .hook(Arc::new(TimingHook));
    if args.profile_memory {
        analytics = analytics.hook(Arc::new(MemoryHook::new()));
    }

    match args.command {
        Command::Normalize { source, target } => {
            let outcome = analytics
                .normalize(&source, &target)
                .with_context(|| format!("normalizing {}", source.display()))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{:?}", outcome);
            }
        }
        Command::PeakDays { store } => run_peak_days(&analytics, &store, args.json)?,
        Command::Emojis { store, strategy } => run_emojis(&analytics, &store, strategy, args.json)?,
        Command::Mentions { store } => run_mentions(&analytics, &store, args.json)?,
        Command::All { store, strategy } => {
            run_peak_days(&analytics, &store, args.json)?;
            run_emojis(&analytics, &store, strategy, args.json)?;
            run_mentions(&analytics, &store, args.json)?;
        }
    }
    Ok(())
}

fn run_peak_days(analytics: &TweetAnalytics, store: &Path, json: bool) -> Result<()> {
    let days = analytics.peak_days(store).context("peak days")?;
    print_rows(json, "Peak days", &days, |d| {
        let user = d.username.as_deref().unwrap_or("(no username)");
        format!("{}  top user: {} ({} of {} posts)", d.date, user, d.posts, d.day_total)
    })
}

fn run_emojis(analytics: &TweetAnalytics, store: &Path, strategy: EmojiStrategy, json: bool) -> Result<()> {
    let emojis = analytics.top_emojis(store, strategy).context("top emojis")?;
    print_rows(json, &format!("Top emojis ({strategy})"), &emojis, |e| format!("{}  {}", e.emoji, e.count))
}

fn run_mentions(analytics: &TweetAnalytics, store: &Path, json: bool) -> Result<()> {
    let mentions = analytics.top_mentions(store).context("top mentions")?;
    print_rows(json, "Top mentions", &mentions, |m| format!("@{}  {}", m.username, m.count))
}
