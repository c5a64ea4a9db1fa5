//! Wi-Fi radio control seam.
//!
//! The provisioning manager drives the radio through [`WifiControl`], so
//! the state machine's side effects stay testable on the host. The real
//! ESP-IDF adapter lives in [`connection`]; the host build gets a
//! [`host`] simulator that feeds synthetic events back into the manager.
//!
//! # Components
//!
//! - [`connection`] - `EspWifi` adapter + event subscriptions (ESP32 only)
//! - [`host`] - simulated radio for host runs

#[cfg(feature = "esp32")]
pub mod connection;

#[cfg(not(feature = "esp32"))]
pub mod host;

use crate::config::Credentials;
use std::fmt;

/// SSID of the configuration access point.
pub const AP_SSID: &str = "SmartHome-Setup";

/// Password of the configuration access point (WPA2 minimum length).
pub const AP_PASSWORD: &str = "12345678";

/// Channel the configuration access point broadcasts on.
pub const AP_CHANNEL: u8 = 1;

/// Maximum simultaneous clients on the configuration access point.
pub const AP_MAX_CONNECTIONS: u16 = 4;

/// Radio operations the provisioning manager needs.
///
/// Commands only; outcomes arrive asynchronously as [`Event`]s through
/// the system-boundary adapter.
///
/// [`Event`]: crate::provisioning::Event
pub trait WifiControl {
    /// Configure the station interface for `creds` and start it.
    ///
    /// Association is issued separately via [`connect`](Self::connect)
    /// once the stack reports the interface up.
    fn start_station(&mut self, creds: &Credentials) -> Result<(), WifiError>;

    /// Issue the association attempt on the started station interface.
    fn connect(&mut self) -> Result<(), WifiError>;

    /// Configure and start the configuration SoftAP.
    fn start_access_point(&mut self) -> Result<(), WifiError>;

    /// Run one blocking scan pass and return the visible network count.
    ///
    /// Returns `Ok(0)` without error when the radio is in a mode that
    /// cannot scan (AP-only).
    fn network_scan_count(&mut self) -> Result<u16, WifiError>;
}

/// Errors that can occur during radio operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    /// SSID could not be handed to the driver.
    InvalidSsid,
    /// Password could not be handed to the driver.
    InvalidPassword,
    /// The underlying driver reported a failure.
    Driver(String),
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "invalid SSID"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Driver(detail) => write!(f, "driver error: {}", detail),
        }
    }
}

impl std::error::Error for WifiError {}
