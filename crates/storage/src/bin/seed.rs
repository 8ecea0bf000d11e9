use std::fmt;

use chrono::{DateTime, Duration, Utc};
use devmap_core::Clock;
use devmap_core::model::{
    AchievementCategory, AchievementState, ProgressDocument, QuestionId, achievements_in,
};
use storage::repository::Storage;
use tracing::info;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    completed: u32,
    days: u32,
    bookmarks: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCompleted { raw: String },
    InvalidDays { raw: String },
    InvalidBookmarks { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCompleted { raw } => write!(f, "invalid --completed value: {raw}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value: {raw}"),
            ArgsError::InvalidBookmarks { raw } => write!(f, "invalid --bookmarks value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("DEVMAP_DB_URL").unwrap_or_else(|_| "sqlite:devmap.sqlite3".into());
        let mut completed = env_u32("DEVMAP_SEED_COMPLETED", 12);
        let mut days = env_u32("DEVMAP_SEED_DAYS", 4);
        let mut bookmarks = env_u32("DEVMAP_SEED_BOOKMARKS", 3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--completed" => {
                    let value = require_value(&mut args, "--completed")?;
                    completed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCompleted { raw: value.clone() })?;
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = value
                        .parse::<u32>()
                        .ok()
                        .filter(|d| *d > 0)
                        .ok_or_else(|| ArgsError::InvalidDays { raw: value.clone() })?;
                }
                "--bookmarks" => {
                    let value = require_value(&mut args, "--bookmarks")?;
                    bookmarks = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidBookmarks { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            completed,
            days: days.max(1),
            bookmarks,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:devmap.sqlite3)");
    eprintln!("  --completed <n>           Questions to mark done (default: 12)");
    eprintln!("  --days <n>                Consecutive days to spread them over (default: 4)");
    eprintln!("  --bookmarks <n>           Questions to bookmark (default: 3)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!(
        "  DEVMAP_DB_URL, DEVMAP_SEED_COMPLETED, DEVMAP_SEED_DAYS, DEVMAP_SEED_BOOKMARKS, RUST_LOG"
    );
}

/// Replay completions day by day so streak and XP come out of the real
/// transitions rather than being written directly.
fn build_progress(args: &Args, now: DateTime<Utc>) -> ProgressDocument {
    let mut doc = ProgressDocument::default();
    let start = now - Duration::days(i64::from(args.days - 1));
    let per_day = args.completed.div_ceil(args.days).max(1);

    for i in 0..args.completed {
        let day = i / per_day;
        let clock = Clock::fixed(start + Duration::days(i64::from(day)));
        doc.toggle_done(&QuestionId::new(format!("seed-{}", i + 1)), &clock);
    }
    for i in 0..args.bookmarks {
        doc.toggle_bookmark(&QuestionId::new(format!("seed-{}", i + 1)));
    }
    doc
}

fn build_achievements(doc: &ProgressDocument, now: DateTime<Utc>) -> AchievementState {
    let mut state = AchievementState::default();
    for achievement in achievements_in(AchievementCategory::Progress) {
        if doc.stats.total_completed >= achievement.requirement {
            state.unlock(achievement.id, now);
        }
    }
    for achievement in achievements_in(AchievementCategory::Streak) {
        if doc.stats.streak_days >= achievement.requirement {
            state.unlock(achievement.id, now);
        }
    }
    state
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let doc = build_progress(&args, now);
    let state = build_achievements(&doc, now);
    storage.progress.save_progress(&doc).await?;
    storage.achievements.save_achievement_state(&state).await?;

    info!(
        db = %args.db_url,
        completed = doc.stats.total_completed,
        streak = doc.stats.streak_days,
        unlocked = state.unlocked.len(),
        "seeded progress"
    );
    println!(
        "Seeded {} completions ({} XP, {}-day streak) and {} achievements into {}",
        doc.stats.total_completed,
        doc.stats.xp,
        doc.stats.streak_days,
        state.unlocked.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
