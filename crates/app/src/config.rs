use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;

use quiz_core::model::{QuestionBank, QuizSettings};
use storage::Storage;

const BUILTIN_BANK: &str = include_str!("../questions.json");

/// Value of `--db` selecting a throwaway in-memory history.
pub const MEMORY_DB: &str = "memory";

#[derive(Debug, Parser)]
#[command(name = "quiz", version, about = "Timed multiple-choice quiz in the terminal")]
pub struct Cli {
    /// Score history database (sqlite URL or path), or "memory"
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    pub db: String,

    /// Time limit in seconds
    #[arg(long, env = "QUIZ_DURATION_SECS", default_value_t = QuizSettings::DEFAULT_DURATION_SECS)]
    pub duration: u32,

    /// JSON question bank; the built-in bank is used when omitted
    #[arg(long, env = "QUIZ_QUESTIONS")]
    pub questions: Option<PathBuf>,
}

impl Cli {
    pub fn settings(&self) -> anyhow::Result<QuizSettings> {
        QuizSettings::new(self.duration).context("invalid --duration")
    }

    pub fn load_bank(&self) -> anyhow::Result<QuestionBank> {
        let bank = match &self.questions {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading question bank {}", path.display()))?;
                parse_bank(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => parse_bank(BUILTIN_BANK).context("parsing built-in question bank")?,
        };
        if bank.is_empty() {
            bail!("question bank is empty");
        }
        Ok(bank)
    }

    /// Open the history backend named by `--db`, creating the file if needed.
    pub async fn storage(&self) -> anyhow::Result<Storage> {
        if self.db == MEMORY_DB {
            return Ok(Storage::in_memory());
        }
        let url = normalize_sqlite_url(&self.db);
        create_db_dir(&url)?;
        Storage::sqlite(&url)
            .await
            .with_context(|| format!("opening {url}"))
    }
}

fn parse_bank(raw: &str) -> anyhow::Result<QuestionBank> {
    Ok(serde_json::from_str(raw)?)
}

/// Turn a bare or `sqlite:` prefixed path into an absolute `sqlite://` URL.
fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// The storage layer creates the database file but not its directory.
fn create_db_dir(db_url: &str) -> anyhow::Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}
