mod console;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use services::{
    Clock, DEFAULT_QUESTION_COUNT, GeneratedQuestionProvider, QuestionBatchProvider, ScoreLedger,
    SessionController, SessionMachine, StaticQuestionBank,
};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::Console;

/// Questions used when no `--bank` file or question generator is configured.
const BUILTIN_BANK: &str = include_str!("../assets/music_questions.json");

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
    UnreadableBank { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::UnreadableBank { path, source } => {
                write!(f, "cannot read --bank {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::UnreadableBank { source, .. } => Some(source),
            ArgsError::InvalidDbUrl { .. } => None,
        }
    }
}

/// Music history trivia in the terminal.
#[derive(Parser, Debug)]
#[command(name = "polyphonia", version, about)]
struct Args {
    /// SQLite database holding the leaderboard (`sqlite::memory:` keeps nothing).
    #[arg(
        long = "db",
        env = "POLYPHONIA_DB_URL",
        default_value = "sqlite://polyphonia.sqlite3"
    )]
    db_url: String,

    /// Questions per session.
    #[arg(
        long,
        env = "POLYPHONIA_QUESTION_COUNT",
        default_value_t = DEFAULT_QUESTION_COUNT,
        value_parser = parse_question_count
    )]
    questions: usize,

    /// Player name for the first session; asked for when omitted.
    #[arg(long, env = "POLYPHONIA_PLAYER")]
    player: Option<String>,

    /// JSON question bank to use instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    bank: Option<PathBuf>,
}

fn parse_question_count(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    // Stdout belongs to the console.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> Result<String, ArgsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: raw.to_owned() });
    }
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return Ok(trimmed.to_owned());
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    Ok(format!("sqlite://{}", absolute.display()))
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// An explicit `--bank` wins, then a configured generator, then the built-in bank.
fn select_provider(
    bank: Option<&Path>,
) -> Result<Arc<dyn QuestionBatchProvider>, Box<dyn std::error::Error>> {
    if let Some(path) = bank {
        let raw = std::fs::read_to_string(path).map_err(|source| ArgsError::UnreadableBank {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = StaticQuestionBank::from_json(&raw)?;
        info!(path = %path.display(), questions = bank.len(), "using question bank file");
        return Ok(Arc::new(bank));
    }

    let generated = GeneratedQuestionProvider::from_env();
    if generated.enabled() {
        info!("using generated questions");
        return Ok(Arc::new(generated));
    }

    let bank = StaticQuestionBank::from_json(BUILTIN_BANK)?;
    info!(questions = bank.len(), "using built-in question bank");
    Ok(Arc::new(bank))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging();

    let db_url = normalize_sqlite_url(&args.db_url)?;
    // Open + migrate SQLite at startup so the services only ever see the trait.
    prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url).await?;
    info!(db = %db_url, "leaderboard storage ready");

    let provider = select_provider(args.bank.as_deref())?;
    let ledger = ScoreLedger::load(Arc::clone(&storage.slots), Clock::system()).await;
    let mut controller = SessionController::new(SessionMachine::new(provider), ledger)
        .with_question_count(args.questions);

    let mut console = Console::new(
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    console.run(&mut controller, args.player).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
