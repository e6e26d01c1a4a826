//! Daily pre-commit hook update check.
//!
//! Runs `pre-commit autoupdate --dry-run` at most once per 24 hours and
//! reports any hook that would be bumped. The last successful check is
//! recorded as `{"last_check": "<RFC 3339>"}` in a cache file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cli::HookCheckArgs;
use crate::error::CliError;

pub const CACHE_FILE_NAME: &str = "pre-commit-update-check";
const PROGRAM: &str = "pre-commit";
const ARGS: [&str; 2] = ["autoupdate", "--dry-run"];

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    last_check: String,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Checked less than a day ago; nothing was run.
    Skipped,
    /// The dry run reported nothing to update.
    UpToDate,
    /// Lines from the dry run announcing an update.
    UpdatesAvailable(Vec<String>),
}

/// Runs the external update query. Swappable so tests never spawn it.
pub trait CommandRunner {
    /// Run `program args...` and return its stdout.
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<String>;
}

/// Spawns the real process.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<String> {
        let output = std::process::Command::new(program).args(args).output()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct UpdateCheck<R> {
    cache_path: PathBuf,
    runner: R,
}

impl<R: CommandRunner> UpdateCheck<R> {
    pub fn new(cache_path: PathBuf, runner: R) -> Self {
        Self { cache_path, runner }
    }

    pub fn run(&self, now: DateTime<Utc>) -> Result<CheckOutcome, CliError> {
        if let Some(last) = read_last_check(&self.cache_path) {
            if now.signed_duration_since(last) < TimeDelta::days(1) {
                debug!(last_check = %last, "checked within the last day; skipping");
                return Ok(CheckOutcome::Skipped);
            }
        }

        let stdout = self
            .runner
            .run(PROGRAM, &ARGS)
            .map_err(|source| CliError::HookCommand {
                command: format!("{PROGRAM} {}", ARGS.join(" ")),
                source,
            })?;

        let updates = find_update_lines(&stdout);
        if !updates.is_empty() {
            // Cache stays stale so the warning repeats until hooks are bumped.
            return Ok(CheckOutcome::UpdatesAvailable(updates));
        }

        write_last_check(&self.cache_path, now)?;
        info!("pre-commit hooks are up to date");
        Ok(CheckOutcome::UpToDate)
    }
}

/// Default cache location inside the user cache directory.
pub fn default_cache_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cache").join(CACHE_FILE_NAME),
        |dirs| dirs.cache_dir().join(CACHE_FILE_NAME),
    )
}

/// Last recorded check, or `None` when the cache is missing or unreadable.
pub fn read_last_check(path: &Path) -> Option<DateTime<Utc>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let record: CacheRecord = serde_json::from_str(&raw).ok()?;
    parse_timestamp(&record.last_check)
}

pub fn write_last_check(path: &Path, now: DateTime<Utc>) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let record = CacheRecord {
        last_check: now.to_rfc3339(),
    };
    std::fs::write(path, serde_json::to_string(&record)?)?;
    Ok(())
}

/// Accepts RFC 3339 and offset-less ISO 8601, the latter read as local
/// wall-clock time.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()?
                .and_local_timezone(Local)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
        })
}

/// Lines of `pre-commit autoupdate --dry-run` output that announce a bump.
pub fn find_update_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.contains("updating") && line.contains("->"))
        .map(str::to_owned)
        .collect()
}

pub fn handle(args: &HookCheckArgs) -> Result<(), CliError> {
    let cache_path = args.cache_file.clone().unwrap_or_else(default_cache_path);
    let check = UpdateCheck::new(cache_path, SystemRunner);

    match check.run(Utc::now())? {
        CheckOutcome::Skipped | CheckOutcome::UpToDate => Ok(()),
        CheckOutcome::UpdatesAvailable(lines) => {
            for line in &lines {
                eprintln!("⚠️  {line}");
            }
            Err(CliError::HookUpdatesAvailable { count: lines.len() })
        }
    }
}
