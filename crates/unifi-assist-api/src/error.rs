use thiserror::Error;

/// Top-level error type for the `unifi-assist-api` crate.
///
/// The client is a pass-through: nothing here is retried or rewritten.
/// Callers decide what to do with a failed request.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// No host given explicitly or via `UNIFI_HOST`.
    #[error("Host must be provided or set in the UNIFI_HOST environment variable")]
    MissingHost,

    /// No API key given explicitly or via `UNIFI_API_KEY`.
    #[error("API key must be provided or set in the UNIFI_API_KEY environment variable")]
    MissingApiKey,

    /// An environment setting could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidSetting { name: &'static str, value: String },

    /// The API key cannot be sent as an HTTP header value.
    #[error("Invalid API key header value: {0}")]
    InvalidHeader(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The HTTP session could not be built (TLS backend setup).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// The controller answered with a status >= 400.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The body was not the JSON shape the endpoint promises.
    #[error("Deserialization error: {message}")]
    Decode { message: String, body: String },
}

impl Error {
    /// Returns `true` for construction-time configuration failures.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingHost
                | Self::MissingApiKey
                | Self::InvalidSetting { .. }
                | Self::InvalidHeader(_)
                | Self::InvalidUrl(_)
        )
    }

    /// HTTP status carried by the error, if the controller answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the controller rejected the API key.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the request never got an HTTP answer.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Tls(_) => true,
            _ => false,
        }
    }
}
