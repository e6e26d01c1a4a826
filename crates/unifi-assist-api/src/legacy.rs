// Legacy stat endpoints
//
// Site-scoped `GET /proxy/network/api/s/{site}/stat/{resource}` calls.
// These always answer `{ "meta": {...}, "data": [...] }`; the envelope is
// stripped before the caller sees it.

use serde_json::Value;
use tracing::{debug, info};

use crate::client::UnifiClient;
use crate::error::Error;

/// Pull the `data` list out of a legacy envelope.
///
/// A missing `data` key is an empty list; any other shape is a decode error.
/// The input is already parsed, so `Error::Decode::body` holds the offending
/// value re-serialized as JSON: the whole envelope when it is not an object,
/// or just the `data` member when that is not an array.
pub fn unwrap_data(envelope: Value) -> Result<Vec<Value>, Error> {
    let Value::Object(mut map) = envelope else {
        return Err(Error::Decode {
            message: "expected a `{ data: [...] }` envelope object".into(),
            body: envelope.to_string(),
        });
    };

    match map.remove("data") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::Decode {
            message: "expected `data` to be an array".into(),
            body: other.to_string(),
        }),
    }
}

impl UnifiClient {
    async fn stat(&self, site: &str, resource: &str) -> Result<Vec<Value>, Error> {
        let envelope = self
            .get_segments(&["proxy", "network", "api", "s", site, "stat", resource])
            .await?;
        unwrap_data(envelope)
    }

    /// Device statistics for a site.
    ///
    /// `GET /proxy/network/api/s/{site}/stat/device`
    pub async fn device_stats(&self, site: &str) -> Result<Vec<Value>, Error> {
        debug!(parent: self.span(), site, "fetching device stats");
        let stats = self.stat(site, "device").await?;
        info!(parent: self.span(), site, count = stats.len(), "found device stats");
        Ok(stats)
    }

    /// Connected-client statistics for a site.
    ///
    /// `GET /proxy/network/api/s/{site}/stat/sta`
    pub async fn client_stats(&self, site: &str) -> Result<Vec<Value>, Error> {
        debug!(parent: self.span(), site, "fetching client stats");
        let stats = self.stat(site, "sta").await?;
        info!(parent: self.span(), site, count = stats.len(), "found client stats");
        Ok(stats)
    }

    /// Subsystem health entries (wan, lan, wlan, vpn, ...).
    ///
    /// `GET /proxy/network/api/s/{site}/stat/health`
    pub async fn network_health(&self, site: &str) -> Result<Vec<Value>, Error> {
        debug!(parent: self.span(), site, "fetching network health");
        let health = self.stat(site, "health").await?;
        info!(parent: self.span(), site, "retrieved network health");
        Ok(health)
    }

    /// Controller system information as seen from a site.
    ///
    /// `GET /proxy/network/api/s/{site}/stat/sysinfo`
    pub async fn site_sysinfo(&self, site: &str) -> Result<Vec<Value>, Error> {
        debug!(parent: self.span(), site, "fetching system info");
        let info = self.stat(site, "sysinfo").await?;
        info!(parent: self.span(), site, "retrieved system info");
        Ok(info)
    }
}
