//! CLI error types with miette diagnostics.
//!
//! Maps `unifi_assist_api::Error` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crate::logging::LoggingError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL: u8 = 1;
    pub const CONFIG: u8 = 3;
    pub const CONNECTION: u8 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(unifi_assist::config),
        help(
            "Pass --host and --api-key, or set UNIFI_HOST and UNIFI_API_KEY.\n\
             API keys are created under Network > Settings > Control Plane > Integrations."
        )
    )]
    Configuration { message: String },

    #[error("Controller rejected the API key (HTTP {status})")]
    #[diagnostic(
        code(unifi_assist::auth_failed),
        help("Check the key, or try --bearer if your controller expects a bearer token.")
    )]
    AuthFailed { status: u16 },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(unifi_assist::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Self-signed certificate? Try again with --insecure (-k)."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: unifi_assist_api::Error,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error (HTTP {status}): {body}")]
    #[diagnostic(code(unifi_assist::api_error))]
    Api { status: u16, body: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(code(unifi_assist::decode))]
    Decode { message: String },

    // ── Hook check ───────────────────────────────────────────────────
    #[error("Updates available for {count} pre-commit hook(s)")]
    #[diagnostic(
        code(unifi_assist::hook_updates),
        help("Run 'pre-commit autoupdate' to update.")
    )]
    HookUpdatesAvailable { count: usize },

    #[error("Could not run '{command}'")]
    #[diagnostic(
        code(unifi_assist::hook_check),
        help("Is pre-commit installed and on PATH?")
    )]
    HookCommand {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ── Logging ──────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(unifi_assist::logging))]
    Logging(#[from] LoggingError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(unifi_assist::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration { .. } | Self::AuthFailed { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}

// ── API error → CliError mapping ─────────────────────────────────────

impl From<unifi_assist_api::Error> for CliError {
    fn from(err: unifi_assist_api::Error) -> Self {
        use unifi_assist_api::Error as ApiError;

        if err.is_configuration() {
            return CliError::Configuration {
                message: err.to_string(),
            };
        }

        if err.is_unauthorized() {
            return CliError::AuthFailed {
                status: err.status().unwrap_or(401),
            };
        }

        match err {
            ApiError::Http { status, body } => CliError::Api { status, body },
            ApiError::Decode { message, .. } => CliError::Decode { message },
            other => CliError::ConnectionFailed {
                url: connection_url(&other),
                source: other,
            },
        }
    }
}

fn connection_url(err: &unifi_assist_api::Error) -> String {
    match err {
        unifi_assist_api::Error::Transport(e) => e
            .url()
            .map_or_else(|| "(unknown)".into(), |u| u.origin().ascii_serialization()),
        _ => "(unknown)".into(),
    }
}
