// Transport configuration for building the session's reqwest::Client.
//
// Everything that shapes the connection pool lives here: TLS verification,
// the optional request timeout and the fixed default headers.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{AuthStyle, ClientConfig};
use crate::error::Error;

const USER_AGENT: &str = concat!("unifi-assist/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

impl TlsMode {
    pub fn from_verify(verify_ssl: bool) -> Self {
        if verify_ssl {
            Self::System
        } else {
            Self::DangerAcceptInvalid
        }
    }
}

/// Settings used every time a session is (re)opened.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// `None` leaves reqwest's defaults in place (no overall timeout).
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self {
            tls: TlsMode::from_verify(config.verify_ssl()),
            timeout: config.timeout(),
        }
    }

    /// Build a `reqwest::Client` with the given default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if self.tls == TlsMode::DangerAcceptInvalid {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// The fixed header set every session request carries.
///
/// `Accept: application/json` plus exactly one auth header, chosen by
/// [`AuthStyle`]. The secret header value is marked sensitive so it never
/// shows up in reqwest's debug output.
pub fn session_headers(api_key: &SecretString, style: AuthStyle) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let (name, raw) = match style {
        AuthStyle::ApiKeyHeader => (
            HeaderName::from_static("x-api-key"),
            api_key.expose_secret().to_owned(),
        ),
        AuthStyle::Bearer => (AUTHORIZATION, format!("Bearer {}", api_key.expose_secret())),
    };

    let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::InvalidHeader(e.to_string()))?;
    value.set_sensitive(true);
    headers.insert(name, value);

    Ok(headers)
}
