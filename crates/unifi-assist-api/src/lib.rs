//! unifi-assist-api: thin async client for the UniFi Network API.
//!
//! One [`UnifiClient`] owns one HTTP session against one controller. It
//! speaks two endpoint families side by side:
//!
//! - Integration v1 (`/proxy/network/integration/v1/...`), returned as-is;
//! - legacy stat (`/proxy/network/api/s/{site}/stat/...`), with the
//!   `data` envelope unwrapped.
//!
//! ```rust,no_run
//! use unifi_assist_api::{ClientConfig, UnifiClient};
//!
//! # async fn demo() -> Result<(), unifi_assist_api::Error> {
//! let config = ClientConfig::builder()
//!     .host("192.168.1.1")
//!     .api_key("your-api-key")
//!     .build()?;
//! let client = UnifiClient::new(config);
//!
//! let sites = client
//!     .scoped(|c| async move { c.list_sites().await })
//!     .await?;
//! println!("{sites}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod integration;
pub mod legacy;
pub mod transport;

pub use client::{SessionGuard, UnifiClient};
pub use config::{AuthStyle, ClientConfig, ClientConfigBuilder};
pub use error::Error;
pub use integration::DeviceActionRequest;
pub use legacy::unwrap_data;
