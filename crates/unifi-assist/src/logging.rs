//! Structured logging setup.
//!
//! Console output goes to stderr: human-readable on a terminal, JSON lines
//! otherwise. With file logging on, two more streams are written into the
//! log directory: `{name}.json.log` (JSON lines) and `{name}.readable.log`
//! (plain text).
//!
//! The global subscriber is installed once. Later calls swap the filter and
//! output layers through reload handles, so configuring again never stacks
//! a second set of writers.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{Level, Span, info_span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, reload};

pub const LOG_LEVEL_VAR: &str = "UNIFI_ASSIST_LOG_LEVEL";
pub const LOG_TO_FILE_VAR: &str = "UNIFI_ASSIST_LOG_TO_FILE";

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type OutputLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

struct LoggingState {
    filter: reload::Handle<EnvFilter, Registry>,
    outputs: reload::Handle<Vec<OutputLayer>, FilteredRegistry>,
    /// Keeps the non-blocking file writers alive; replaced on reconfigure.
    guards: Vec<WorkerGuard>,
}

static LOGGING: Mutex<Option<LoggingState>> = Mutex::new(None);

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("cannot open log file in {dir}: {reason}")]
    File { dir: String, reason: String },

    #[error("failed to reconfigure logging: {0}")]
    Reload(#[from] reload::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What to configure. `None` fields fall back to the environment.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub name: String,
    pub level: Option<Level>,
    pub log_to_file: Option<bool>,
    pub log_dir: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            name: "unifi_assist".into(),
            level: None,
            log_to_file: None,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl LogSettings {
    fn resolve<F>(&self, env: F) -> Result<(Level, bool), LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = match self.level {
            Some(level) => level,
            None => env(LOG_LEVEL_VAR)
                .map(|raw| parse_level(&raw))
                .transpose()?
                .unwrap_or(Level::INFO),
        };

        let to_file = match self.log_to_file {
            Some(on) => on,
            None => env(LOG_TO_FILE_VAR)
                .map(|raw| parse_flag(&raw))
                .transpose()?
                .unwrap_or(false),
        };

        Ok((level, to_file))
    }
}

/// Configure process-wide logging and return a span bound to `name`.
///
/// Safe to call repeatedly; each call replaces the previous configuration.
pub fn setup_logging(settings: &LogSettings) -> Result<Span, LoggingError> {
    let (level, to_file) = settings.resolve(|name| std::env::var(name).ok())?;

    let filter = build_filter(level);
    let (outputs, guards) = build_outputs(&settings.name, to_file, &settings.log_dir)?;

    let mut state = LOGGING.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(current) = state.as_mut() {
        current.filter.reload(filter)?;
        current.outputs.reload(outputs)?;
        // Dropping the old guards flushes the previous file writers.
        current.guards = guards;
    } else {
        let (filter_layer, filter) = reload::Layer::new(filter);
        let (output_layer, outputs) = reload::Layer::new(outputs);

        let installed = tracing_subscriber::registry()
            .with(filter_layer)
            .with(output_layer)
            .try_init();

        match installed {
            Ok(()) => {
                *state = Some(LoggingState {
                    filter,
                    outputs,
                    guards,
                });
            }
            // Someone else owns the global subscriber; our layers went
            // away with the rejected registry, so there is nothing to keep.
            Err(_) => tracing::debug!("global tracing subscriber already set; keeping it"),
        }
    }
    drop(state);

    let span = info_span!("logger", name = %settings.name);
    tracing::debug!(
        parent: &span,
        level = %level,
        to_file,
        log_dir = %settings.log_dir.display(),
        "logging configured"
    );
    Ok(span)
}

/// Flush and close the file writers.
///
/// Blocks until the background writers have drained. Events recorded
/// afterwards still reach the console but no longer the log files.
pub fn shutdown() {
    let mut state = LOGGING.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(current) = state.as_mut() {
        drop(std::mem::take(&mut current.guards));
    }
}

/// `RUST_LOG` wins when set; otherwise everything at `level` and above.
fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()))
}

fn build_outputs(
    name: &str,
    to_file: bool,
    log_dir: &Path,
) -> Result<(Vec<OutputLayer>, Vec<WorkerGuard>), LoggingError> {
    let mut layers: Vec<OutputLayer> = Vec::new();
    let mut guards = Vec::new();

    if std::io::stderr().is_terminal() {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
        );
    } else {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    }

    if to_file {
        std::fs::create_dir_all(log_dir)?;

        let (json_writer, json_guard) =
            tracing_appender::non_blocking(file_appender(log_dir, &format!("{name}.json.log"))?);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(json_writer)
                .with_ansi(false)
                .boxed(),
        );

        let (text_writer, text_guard) =
            tracing_appender::non_blocking(file_appender(log_dir, &format!("{name}.readable.log"))?);
        layers.push(
            fmt::layer()
                .with_writer(text_writer)
                .with_ansi(false)
                .with_target(true)
                .boxed(),
        );

        guards.push(json_guard);
        guards.push(text_guard);
    }

    Ok((layers, guards))
}

fn file_appender(dir: &Path, file_name: &str) -> Result<RollingFileAppender, LoggingError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| LoggingError::File {
            dir: dir.display().to_string(),
            reason: e.to_string(),
        })
}

fn parse_level(raw: &str) -> Result<Level, LoggingError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        _ => Err(LoggingError::InvalidLevel(raw.to_owned())),
    }
}

fn parse_flag(raw: &str) -> Result<bool, LoggingError> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n != 0);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" | "" => Ok(false),
        _ => Err(LoggingError::InvalidSetting {
            name: LOG_TO_FILE_VAR,
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_to_info_without_files() {
        let (level, to_file) = LogSettings::default().resolve(no_env).unwrap();
        assert_eq!(level, Level::INFO);
        assert!(!to_file);
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = |name: &str| match name {
            LOG_LEVEL_VAR => Some("debug".to_owned()),
            LOG_TO_FILE_VAR => Some("1".to_owned()),
            _ => None,
        };
        let (level, to_file) = LogSettings::default().resolve(env).unwrap();
        assert_eq!(level, Level::DEBUG);
        assert!(to_file);
    }

    #[test]
    fn explicit_settings_beat_environment() {
        let env = |name: &str| match name {
            LOG_LEVEL_VAR => Some("debug".to_owned()),
            LOG_TO_FILE_VAR => Some("1".to_owned()),
            _ => None,
        };
        let settings = LogSettings {
            level: Some(Level::WARN),
            log_to_file: Some(false),
            ..LogSettings::default()
        };
        let (level, to_file) = settings.resolve(env).unwrap();
        assert_eq!(level, Level::WARN);
        assert!(!to_file);
    }

    #[test]
    fn rejects_unknown_level() {
        let env = |name: &str| (name == LOG_LEVEL_VAR).then(|| "loud".to_owned());
        assert!(matches!(
            LogSettings::default().resolve(env),
            Err(LoggingError::InvalidLevel(_))
        ));
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag("nope").is_err());
    }

    #[test]
    fn repeated_setup_reconfigures_and_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let settings = LogSettings {
            name: "repeat".into(),
            level: Some(Level::INFO),
            log_to_file: Some(true),
            log_dir: log_dir.clone(),
        };

        let first = setup_logging(&settings).unwrap();
        let second = setup_logging(&settings).unwrap();
        tracing::info!(parent: &second, "hello from the second configuration");
        drop(first);
        shutdown();

        for file in ["repeat.json.log", "repeat.readable.log"] {
            let written = std::fs::read_to_string(log_dir.join(file)).unwrap();
            assert!(
                written.contains("hello from the second configuration"),
                "{file} is missing the event:\n{written}"
            );
        }

        // Back to console-only; must not fail either.
        let console_only = LogSettings {
            log_to_file: Some(false),
            ..settings
        };
        setup_logging(&console_only).unwrap();
    }
}
