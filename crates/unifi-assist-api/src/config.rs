// Client configuration and credential resolution.
//
// Each field resolves explicit value -> environment variable -> default
// (or failure for host and API key). Nothing here touches the network.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

pub const HOST_VAR: &str = "UNIFI_HOST";
pub const API_KEY_VAR: &str = "UNIFI_API_KEY";
pub const VERIFY_SSL_VAR: &str = "UNIFI_VERIFY_SSL";
pub const TIMEOUT_VAR: &str = "UNIFI_TIMEOUT";

/// How the API key is presented to the controller.
///
/// A client uses exactly one of these; the two headers are never combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStyle {
    /// `X-API-KEY: <key>`, the Integration API's documented scheme.
    #[default]
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`.
    Bearer,
}

/// Immutable connection settings for one controller.
#[derive(Clone)]
pub struct ClientConfig {
    host: String,
    base_url: Url,
    api_key: SecretString,
    verify_ssl: bool,
    auth_style: AuthStyle,
    timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("verify_ssl", &self.verify_ssl)
            .field("auth_style", &self.auth_style)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// The host as given (bare host or full URL).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Controller root, e.g. `https://192.168.1.1/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    pub fn auth_style(&self) -> AuthStyle {
        self.auth_style
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ClientConfig`]; unset fields fall back to the environment.
#[derive(Default)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    api_key: Option<SecretString>,
    verify_ssl: Option<bool>,
    auth_style: AuthStyle,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Controller host (`192.168.1.1`, `unifi.local:8443`) or full URL.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    pub fn auth_style(mut self, style: AuthStyle) -> Self {
        self.auth_style = style;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve against the process environment.
    pub fn build(self) -> Result<ClientConfig, Error> {
        self.build_with_env(|name| std::env::var(name).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn build_with_env<F>(self, env: F) -> Result<ClientConfig, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .or_else(|| lookup(HOST_VAR))
            .map(|h| h.trim().to_owned())
            .ok_or(Error::MissingHost)?;

        let api_key = match self.api_key {
            Some(key) if !secrecy::ExposeSecret::expose_secret(&key).trim().is_empty() => key,
            _ => lookup(API_KEY_VAR)
                .map(SecretString::from)
                .ok_or(Error::MissingApiKey)?,
        };

        let verify_ssl = match self.verify_ssl {
            Some(v) => v,
            None => lookup(VERIFY_SSL_VAR)
                .map(|raw| parse_bool(VERIFY_SSL_VAR, &raw))
                .transpose()?
                .unwrap_or(true),
        };

        let timeout = match self.timeout {
            Some(t) => Some(t),
            None => lookup(TIMEOUT_VAR)
                .map(|raw| parse_secs(TIMEOUT_VAR, &raw))
                .transpose()?,
        };

        let base_url = base_url_for(&host)?;

        Ok(ClientConfig {
            host,
            base_url,
            api_key,
            verify_ssl,
            auth_style: self.auth_style,
            timeout,
        })
    }
}

/// `https://{host}` for a bare host; full `http(s)://` URLs pass through.
fn base_url_for(host: &str) -> Result<Url, Error> {
    let trimmed = host.trim_end_matches('/');
    let raw = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    Ok(Url::parse(&raw)?)
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidSetting {
            name,
            value: raw.to_owned(),
        }),
    }
}

fn parse_secs(name: &'static str, raw: &str) -> Result<Duration, Error> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::InvalidSetting {
            name,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let cfg = ClientConfig::builder()
            .host("10.0.0.1")
            .api_key("explicit")
            .build_with_env(env_of(&[(HOST_VAR, "192.168.1.1"), (API_KEY_VAR, "from-env")]))
            .unwrap();

        assert_eq!(cfg.host(), "10.0.0.1");
        assert_eq!(cfg.api_key().expose_secret(), "explicit");
        assert_eq!(cfg.base_url().as_str(), "https://10.0.0.1/");
        assert!(cfg.verify_ssl());
        assert_eq!(cfg.auth_style(), AuthStyle::ApiKeyHeader);
        assert_eq!(cfg.timeout(), None);
    }

    #[test]
    fn environment_fills_missing_fields() {
        let cfg = ClientConfig::builder()
            .build_with_env(env_of(&[
                (HOST_VAR, "unifi.local:8443"),
                (API_KEY_VAR, "from-env"),
                (VERIFY_SSL_VAR, "false"),
                (TIMEOUT_VAR, "15"),
            ]))
            .unwrap();

        assert_eq!(cfg.base_url().as_str(), "https://unifi.local:8443/");
        assert_eq!(cfg.api_key().expose_secret(), "from-env");
        assert!(!cfg.verify_ssl());
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn missing_host_fails_even_with_key() {
        let err = ClientConfig::builder()
            .api_key("key")
            .build_with_env(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingHost));
    }

    #[test]
    fn missing_key_fails_even_with_host() {
        let err = ClientConfig::builder()
            .host("192.168.1.1")
            .build_with_env(env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = ClientConfig::builder()
            .host("   ")
            .api_key("key")
            .build_with_env(env_of(&[(HOST_VAR, "")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingHost));

        let err = ClientConfig::builder()
            .host("192.168.1.1")
            .api_key("")
            .build_with_env(env_of(&[(API_KEY_VAR, " ")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingApiKey));
    }

    #[test]
    fn full_urls_are_kept() {
        let cfg = ClientConfig::builder()
            .host("http://127.0.0.1:9000/")
            .api_key("key")
            .build_with_env(env_of(&[]))
            .unwrap();
        assert_eq!(cfg.base_url().as_str(), "http://127.0.0.1:9000/");
    }

    #[test]
    fn bad_environment_settings_are_rejected() {
        let err = ClientConfig::builder()
            .host("h")
            .api_key("k")
            .build_with_env(env_of(&[(TIMEOUT_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { name: TIMEOUT_VAR, .. }));

        let err = ClientConfig::builder()
            .host("h")
            .api_key("k")
            .build_with_env(env_of(&[(VERIFY_SSL_VAR, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { name: VERIFY_SSL_VAR, .. }));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let cfg = ClientConfig::builder()
            .host("h")
            .api_key("super-secret")
            .build_with_env(env_of(&[]))
            .unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
