//! Smart-home panel firmware library.
//!
//! Connectivity provisioning for a display device that must join a Wi-Fi
//! network without a pre-programmed credential: a fallback SoftAP with a
//! captive-portal form, NVS-persisted credentials, bounded reconnect
//! retries, and a one-shot BLE/Wi-Fi discovery scan at boot.
//!
//! Platform-independent components live at the top level and are tested
//! on the host; hardware adapters are gated behind the `esp32` feature.

pub mod ble;
pub mod config;
pub mod discovery;
pub mod persistence;
pub mod portal;
pub mod provisioning;
pub mod status;
pub mod wifi;

// Re-export commonly used items
pub use config::{ConfigError, Credentials, MAX_PASSWORD_LEN, MAX_SSID_LEN};
pub use persistence::{CredentialStore, StorageError};
pub use portal::{PortalServer, PORTAL_PORT};
pub use provisioning::{ConnectionState, Event, Machine, ProvisioningManager, MAX_RETRY};
pub use status::StatusHub;
