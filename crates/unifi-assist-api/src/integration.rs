// Integration API (v1) endpoints.
//
// Base path: /proxy/network/integration/v1/
// Responses are returned exactly as the controller sent them; list
// endpoints keep whatever envelope the controller uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{UnifiClient, payload_len};
use crate::error::Error;

const V1: [&str; 4] = ["proxy", "network", "integration", "v1"];

/// Device action request body.
///
/// Known actions: `RESTART`, `ADOPT`, `LOCATE_ON`, `LOCATE_OFF`. Any other
/// body can be posted through [`UnifiClient::perform_device_action`]
/// directly since it accepts anything serializable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceActionRequest {
    pub action: String,
}

impl DeviceActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    pub fn restart() -> Self {
        Self::new("RESTART")
    }

    pub fn adopt() -> Self {
        Self::new("ADOPT")
    }

    pub fn locate(on: bool) -> Self {
        Self::new(if on { "LOCATE_ON" } else { "LOCATE_OFF" })
    }
}

fn v1<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    V1.iter().copied().chain(rest.iter().copied()).collect()
}

impl UnifiClient {
    /// `GET /proxy/network/integration/v1/sites`
    pub async fn list_sites(&self) -> Result<Value, Error> {
        debug!(parent: self.span(), "fetching available sites");
        let sites = self.get_segments(&v1(&["sites"])).await?;
        if let Some(count) = payload_len(&sites) {
            info!(parent: self.span(), count, "found sites");
        }
        Ok(sites)
    }

    /// `GET /proxy/network/integration/v1/sites/{site_id}/devices`
    pub async fn list_devices(&self, site_id: &str) -> Result<Value, Error> {
        debug!(parent: self.span(), site_id, "fetching devices");
        let devices = self
            .get_segments(&v1(&["sites", site_id, "devices"]))
            .await?;
        if let Some(count) = payload_len(&devices) {
            info!(parent: self.span(), site_id, count, "found devices");
        }
        Ok(devices)
    }

    /// `GET /proxy/network/integration/v1/sites/{site_id}/devices/{device_id}`
    pub async fn get_device_details(&self, site_id: &str, device_id: &str) -> Result<Value, Error> {
        debug!(parent: self.span(), site_id, device_id, "fetching device details");
        self.get_segments(&v1(&["sites", site_id, "devices", device_id]))
            .await
    }

    /// `GET /proxy/network/integration/v1/sites/{site_id}/devices/{device_id}/statistics/latest`
    pub async fn get_device_statistics(
        &self,
        site_id: &str,
        device_id: &str,
    ) -> Result<Value, Error> {
        debug!(parent: self.span(), site_id, device_id, "fetching device statistics");
        self.get_segments(&v1(&[
            "sites",
            site_id,
            "devices",
            device_id,
            "statistics",
            "latest",
        ]))
        .await
    }

    /// `POST /proxy/network/integration/v1/sites/{site_id}/devices/{device_id}/actions`
    pub async fn perform_device_action<B>(
        &self,
        site_id: &str,
        device_id: &str,
        action: &B,
    ) -> Result<Value, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        debug!(parent: self.span(), site_id, device_id, "performing device action");
        self.post_segments(
            &v1(&["sites", site_id, "devices", device_id, "actions"]),
            action,
        )
        .await
    }

    /// `GET /proxy/network/integration/v1/sites/{site_id}/clients`
    pub async fn list_clients(&self, site_id: &str) -> Result<Value, Error> {
        debug!(parent: self.span(), site_id, "fetching clients");
        let clients = self
            .get_segments(&v1(&["sites", site_id, "clients"]))
            .await?;
        if let Some(count) = payload_len(&clients) {
            info!(parent: self.span(), site_id, count, "found clients");
        }
        Ok(clients)
    }

    /// `GET /proxy/network/integration/v1/info`
    pub async fn get_system_info(&self) -> Result<Value, Error> {
        debug!(parent: self.span(), "fetching system info");
        self.get_segments(&v1(&["info"])).await
    }
}
