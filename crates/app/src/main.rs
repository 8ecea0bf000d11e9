use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use services::{Clock, TrackerServices, load_catalog_file};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod repl;

use repl::{Command, Flow};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

/// Where the tracker keeps its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Database {
    Memory,
    File(PathBuf),
}

impl Database {
    const MEMORY_URL: &'static str = "sqlite::memory:";

    /// Accepts `sqlite::memory:`, `sqlite:<path>`, `sqlite://<path>` or a
    /// bare path. Relative paths resolve against the working directory.
    fn resolve(raw: &str) -> Result<Self, ArgsError> {
        let trimmed = raw.trim();
        if trimmed == Self::MEMORY_URL {
            return Ok(Self::Memory);
        }
        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() {
            return Err(ArgsError::InvalidDbUrl {
                raw: raw.to_string(),
            });
        }
        let path = Path::new(path);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };
        Ok(Self::File(absolute))
    }

    /// Connection URL; `mode=rwc` lets SQLite create a missing file.
    fn url(&self) -> String {
        match self {
            Self::Memory => Self::MEMORY_URL.to_string(),
            Self::File(path) => format!("sqlite://{}?mode=rwc", path.display()),
        }
    }
}

struct Args {
    database: Database,
    catalog: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url|path>] [--catalog <path.json>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:devmap.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DEVMAP_DB_URL, DEVMAP_CATALOG, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let db = std::env::var("DEVMAP_DB_URL").unwrap_or_else(|_| "devmap.sqlite3".into());
        let mut database = Database::resolve(&db)?;
        let mut catalog = std::env::var_os("DEVMAP_CATALOG").map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    database = Database::resolve(&require_value(args, "--db")?)?;
                }
                "--catalog" => {
                    catalog = Some(PathBuf::from(require_value(args, "--catalog")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { database, catalog })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let catalog = parsed
        .catalog
        .as_deref()
        .map(load_catalog_file)
        .transpose()?;

    // Open + migrate SQLite at startup; services only see the repository traits.
    if let Database::File(path) = &parsed.database
        && let Some(parent) = path.parent()
    {
        std::fs::create_dir_all(parent)?;
    }
    let services =
        TrackerServices::new_sqlite(&parsed.database.url(), Clock::default_clock(), catalog)
            .await?;
    let mut ctx = services.context().await;
    info!(
        completed = ctx.stats().total_completed,
        unlocked = ctx.unlocked_count(),
        "progress loaded"
    );

    let mut out = std::io::stdout();
    writeln!(out, "Type `help` for commands.")?;
    repl::render_notifications(&mut ctx, &mut out)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(repl::CommandError::Empty) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };
        if repl::execute(&mut ctx, command, &mut out).await? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
