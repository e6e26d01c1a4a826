// UniFi API client: session lifecycle and request primitives.
//
// The session is a reqwest::Client (one connection pool) created on first
// use or on scope entry and released on close(). Endpoint methods live in
// integration.rs and legacy.rs as inherent impls.

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, Span, debug, info_span};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::transport::{TransportConfig, session_headers};

/// Async client bound to one controller host.
///
/// Owns at most one open HTTP session. Any request opens it if needed,
/// so calling an endpoint after [`close`](Self::close) transparently starts
/// a fresh session. Requests issued concurrently against an open session
/// are independent round trips.
pub struct UnifiClient {
    config: ClientConfig,
    transport: TransportConfig,
    session: ArcSwapOption<reqwest::Client>,
    span: Span,
}

impl UnifiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Create a client. No network I/O happens here.
    pub fn new(config: ClientConfig) -> Self {
        let span = info_span!("unifi_client", host = %config.host());
        let transport = TransportConfig::from_client_config(&config);
        debug!(parent: &span, host = %config.host(), "initializing UniFi client");

        Self {
            config,
            transport,
            session: ArcSwapOption::empty(),
            span,
        }
    }

    /// Create a client entirely from `UNIFI_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self::new(ClientConfig::builder().build()?))
    }

    /// Attach the span request logs are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.session.load().is_some()
    }

    /// Return the open session, creating it if necessary.
    ///
    /// Cheap when a session already exists: one atomic load.
    pub fn ensure_session(&self) -> Result<Arc<reqwest::Client>, Error> {
        if let Some(http) = self.session.load_full() {
            return Ok(http);
        }

        let headers = session_headers(self.config.api_key(), self.config.auth_style())?;
        let fresh = Arc::new(self.transport.build_client_with_headers(headers)?);

        // Two racing openers keep whichever session landed first.
        let previous = self
            .session
            .compare_and_swap(&None::<Arc<reqwest::Client>>, Some(Arc::clone(&fresh)));

        match &*previous {
            Some(existing) => Ok(Arc::clone(existing)),
            None => {
                debug!(parent: &self.span, base_url = %self.config.base_url(), "opened HTTP session");
                Ok(fresh)
            }
        }
    }

    /// Release the session and its connection pool.
    ///
    /// Idempotent. Returns `true` if an open session was actually released.
    /// In-flight requests keep their own handle and finish normally.
    pub fn close(&self) -> bool {
        if self.session.swap(None).is_some() {
            debug!(parent: &self.span, "closed HTTP session");
            true
        } else {
            false
        }
    }

    /// Open the session and return a guard that closes it when dropped.
    ///
    /// The guard closes on every exit path: normal return, `?`
    /// propagation, early return and panic unwinding.
    pub fn enter(&self) -> Result<SessionGuard<'_>, Error> {
        self.ensure_session()?;
        debug!(parent: &self.span, "entering client scope");
        Ok(SessionGuard { client: self })
    }

    /// Run `f` inside a session scope; the session is closed afterwards
    /// whether `f` succeeds or fails.
    pub async fn scoped<'a, F, Fut, T, E>(&'a self, f: F) -> Result<T, E>
    where
        F: FnOnce(&'a Self) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<Error>,
    {
        let guard = self.enter()?;
        f(guard.client).await
    }

    // ── Request primitives ───────────────────────────────────────────

    /// `GET {base_url}{path}` and decode the JSON body.
    ///
    /// `path` is used verbatim: query strings and existing percent-escapes
    /// are passed through untouched.
    pub async fn get_json(&self, path: &str) -> Result<Value, Error> {
        let url = self.raw_url(path)?;
        self.request::<Value>(Method::GET, url, None).await
    }

    /// `POST {base_url}{path}` with a JSON body and decode the JSON reply.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.raw_url(path)?;
        self.request(Method::POST, url, Some(body)).await
    }

    pub(crate) async fn get_segments(&self, segments: &[&str]) -> Result<Value, Error> {
        let url = self.url(segments)?;
        self.request::<Value>(Method::GET, url, None).await
    }

    pub(crate) async fn post_segments<B>(&self, segments: &[&str], body: &B) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(segments)?;
        self.request(Method::POST, url, Some(body)).await
    }

    async fn request<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let http = self.ensure_session()?;

        async move {
            debug!("{method} {url}");

            let mut req = http.request(method, url);
            if let Some(body) = body {
                req = req.json(body);
            }

            let resp = req.send().await?;
            handle_response(resp).await
        }
        .instrument(self.span.clone())
        .await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.config.base_url().clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `{base_url}{path}` without re-encoding `path`.
    pub(crate) fn raw_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.config.base_url().as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl Drop for UnifiClient {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Scoped session ───────────────────────────────────────────────────

/// RAII scope over a [`UnifiClient`] session, returned by
/// [`UnifiClient::enter`]. Dereferences to the client.
#[must_use = "dropping the guard closes the session immediately"]
pub struct SessionGuard<'a> {
    client: &'a UnifiClient,
}

impl Deref for SessionGuard<'_> {
    type Target = UnifiClient;

    fn deref(&self) -> &UnifiClient {
        self.client
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        debug!(parent: &self.client.span, "exiting client scope");
        self.client.close();
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if status.as_u16() >= 400 {
        debug!(status = status.as_u16(), "request failed");
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    // Some actions answer 2xx with no body at all.
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Decode {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Number of items in a list payload, looking inside a `data` envelope.
pub(crate) fn payload_len(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => map.get("data").and_then(Value::as_array).map(Vec::len),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    fn client() -> UnifiClient {
        let config = ClientConfig::builder()
            .host("192.168.1.1")
            .api_key("key")
            .build_with_env(|_| None)
            .unwrap();
        UnifiClient::new(config)
    }

    #[test]
    fn construction_does_not_open_a_session() {
        assert!(!client().is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let client = client();
        assert!(!client.close());
        assert!(!client.close());

        client.ensure_session().unwrap();
        assert!(client.is_open());
        assert!(client.close());
        assert!(!client.close());
        assert!(!client.is_open());
    }

    #[test]
    fn ensure_session_reuses_the_open_session() {
        let client = client();
        let first = client.ensure_session().unwrap();
        let second = client.ensure_session().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn guard_closes_on_drop() {
        let client = client();
        {
            let guard = client.enter().unwrap();
            assert!(guard.is_open());
        }
        assert!(!client.is_open());
    }

    #[test]
    fn urls_encode_segments() {
        let client = client();
        let url = client.url(&["proxy", "network", "sites", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://192.168.1.1/proxy/network/sites/a%20b%2Fc");
    }

    #[test]
    fn raw_urls_keep_query_and_escapes() {
        let client = client();
        let url = client.raw_url("/proxy/network/integration/v1/sites?limit=200").unwrap();
        assert_eq!(
            url.as_str(),
            "https://192.168.1.1/proxy/network/integration/v1/sites?limit=200"
        );
        assert_eq!(url.query(), Some("limit=200"));

        let url = client.raw_url("proxy/network/api/s/a%20b/stat/device").unwrap();
        assert_eq!(url.path(), "/proxy/network/api/s/a%20b/stat/device");
    }

    #[test]
    fn payload_len_reads_lists_and_envelopes() {
        assert_eq!(payload_len(&json!([1, 2])), Some(2));
        assert_eq!(payload_len(&json!({"data": [1]})), Some(1));
        assert_eq!(payload_len(&json!({"name": "x"})), None);
    }
}
