//! Snapshot controller responses into JSON fixture files.
//!
//! Walks sites, system info, then per site the device and client lists,
//! then per device its details and latest statistics. Each response is
//! saved with capture metadata so fixtures can be traced back later.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use unifi_assist_api::UnifiClient;

use crate::cli::CaptureArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Fixture<'a> {
    captured_at: &'a str,
    site: Option<&'a str>,
    endpoint: &'a str,
    response: &'a Value,
}

/// Writes fixture files into one directory.
pub struct FixtureWriter {
    dir: PathBuf,
}

impl FixtureWriter {
    /// Create the writer, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CliError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(
        &self,
        endpoint: &str,
        site: Option<&str>,
        response: &Value,
    ) -> Result<PathBuf, CliError> {
        let captured_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let path = self.dir.join(fixture_file_name(endpoint, site, &captured_at));

        let fixture = Fixture {
            captured_at: &captured_at,
            site,
            endpoint,
            response,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&fixture)?)?;

        info!(path = %path.display(), "saved response");
        Ok(path)
    }
}

/// `{site}_{endpoint}_{timestamp}.json`, with `:` made filename-safe.
pub fn fixture_file_name(endpoint: &str, site: Option<&str>, captured_at: &str) -> String {
    let stamp = captured_at.replace(':', "-");
    match site {
        Some(site) => format!("{site}_{endpoint}_{stamp}.json"),
        None => format!("{endpoint}_{stamp}.json"),
    }
}

/// `id` of every entry in a response's `data` list; `None` where missing.
fn data_ids(response: &Value) -> Vec<Option<String>> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.get("id").and_then(Value::as_str).map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Totals for the summary line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub sites: usize,
    pub devices: usize,
    pub files: usize,
}

pub async fn capture(client: &UnifiClient, writer: &FixtureWriter) -> Result<CaptureSummary, CliError> {
    let mut summary = CaptureSummary::default();

    let sites = client.list_sites().await?;
    writer.save("sites", None, &sites)?;
    summary.files += 1;

    let site_ids = data_ids(&sites);
    if site_ids.is_empty() {
        warn!("no sites found");
        return Ok(summary);
    }

    let info = client.get_system_info().await?;
    writer.save("info", None, &info)?;
    summary.files += 1;

    for site_id in site_ids {
        let Some(site_id) = site_id else {
            warn!("site missing id, skipping");
            continue;
        };
        info!(site_id = %site_id, "processing site");
        summary.sites += 1;

        let devices = client.list_devices(&site_id).await?;
        writer.save("devices", Some(&site_id), &devices)?;

        let clients = client.list_clients(&site_id).await?;
        writer.save("clients", Some(&site_id), &clients)?;
        summary.files += 2;

        for device_id in data_ids(&devices) {
            let Some(device_id) = device_id else {
                warn!(site_id = %site_id, "device missing id, skipping");
                continue;
            };
            info!(site_id = %site_id, device_id = %device_id, "capturing device");
            summary.devices += 1;

            let details = client.get_device_details(&site_id, &device_id).await?;
            writer.save(&format!("device_details_{device_id}"), Some(&site_id), &details)?;

            let stats = client.get_device_statistics(&site_id, &device_id).await?;
            writer.save(&format!("device_stats_{device_id}"), Some(&site_id), &stats)?;
            summary.files += 2;
        }
    }

    Ok(summary)
}

pub async fn handle(args: &CaptureArgs, client: &UnifiClient) -> Result<(), CliError> {
    let writer = FixtureWriter::new(&args.output_dir)?;

    let summary = client.scoped(|c| capture(c, &writer)).await?;

    println!(
        "Captured {} file(s) for {} site(s) and {} device(s) into {}",
        summary.files,
        summary.sites,
        summary.devices,
        writer.dir().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use unifi_assist_api::ClientConfig;

    use super::*;

    const V1: &str = "/proxy/network/integration/v1";

    async fn mount(server: &MockServer, route: String, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer) -> UnifiClient {
        let config = ClientConfig::builder()
            .host(server.uri())
            .api_key("test-key")
            .build_with_env(|_| None)
            .unwrap();
        UnifiClient::new(config)
    }

    #[test]
    fn file_names_are_filesystem_safe() {
        assert_eq!(
            fixture_file_name("sites", None, "2024-01-01T10:20:30.000001Z"),
            "sites_2024-01-01T10-20-30.000001Z.json"
        );
        assert_eq!(
            fixture_file_name("devices", Some("abc"), "T1:2"),
            "abc_devices_T1-2.json"
        );
    }

    #[test]
    fn data_ids_tolerate_missing_ids() {
        let ids = data_ids(&json!({"data": [{"id": "a"}, {"name": "no id"}]}));
        assert_eq!(ids, vec![Some("a".to_owned()), None]);
        assert!(data_ids(&json!([{"id": "a"}])).is_empty());
    }

    #[tokio::test]
    async fn captures_every_endpoint() {
        let server = MockServer::start().await;

        mount(&server, format!("{V1}/sites"), json!({"data": [{"id": "s1"}, {"name": "orphan"}]})).await;
        mount(&server, format!("{V1}/info"), json!({"applicationVersion": "9.0"})).await;
        mount(&server, format!("{V1}/sites/s1/devices"), json!({"data": [{"id": "d1"}]})).await;
        mount(&server, format!("{V1}/sites/s1/clients"), json!({"data": []})).await;
        mount(&server, format!("{V1}/sites/s1/devices/d1"), json!({"id": "d1"})).await;
        mount(
            &server,
            format!("{V1}/sites/s1/devices/d1/statistics/latest"),
            json!({"cpuUtilizationPct": 3.5}),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let writer = FixtureWriter::new(dir.path().join("api_responses")).unwrap();
        let client = client_for(&server);

        let summary = capture(&client, &writer).await.unwrap();

        assert_eq!(
            summary,
            CaptureSummary {
                sites: 1,
                devices: 1,
                files: 6,
            }
        );

        let mut names: Vec<String> = std::fs::read_dir(writer.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 6);
        assert!(names.iter().any(|n| n.starts_with("s1_device_stats_d1_")));
        assert!(names.iter().any(|n| n.starts_with("info_")));

        let sites_file = names.iter().find(|n| n.starts_with("sites_")).unwrap();
        let saved: Value =
            serde_json::from_str(&std::fs::read_to_string(writer.dir().join(sites_file)).unwrap())
                .unwrap();
        assert_eq!(saved["endpoint"], "sites");
        assert!(saved["site"].is_null());
        assert_eq!(saved["response"]["data"][0]["id"], "s1");
    }

    #[tokio::test]
    async fn stops_after_sites_when_none_found() {
        let server = MockServer::start().await;
        mount(&server, format!("{V1}/sites"), json!({"data": []})).await;

        let dir = tempfile::tempdir().unwrap();
        let writer = FixtureWriter::new(dir.path()).unwrap();
        let client = client_for(&server);

        let summary = capture(&client, &writer).await.unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.sites, 0);
    }
}
