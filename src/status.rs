//! UI-facing status interface.
//!
//! The graphical layer (status cards, room grid) is an external
//! collaborator; it talks to this crate only through [`StatusHub`]:
//! read-only snapshots of provisioning-relevant data, write accessors for
//! externally-sourced telemetry, and one registrable callback fired after
//! every change so the display can refresh.
//!
//! The hub is shared (`Arc<StatusHub>`) between the provisioning manager,
//! the scan workers, and the sensor readers. The update callback is always
//! invoked after the data lock has been released, so it may freely read
//! back through the hub.

use crate::discovery::{BleScanSummary, ScanOutcome, ScanTracker};
use crate::provisioning::ConnectionState;
use std::sync::Mutex;

/// An environment sample from the external sensor reader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvReading {
    /// Temperature in degrees Celsius.
    pub temperature_c: f32,
    /// Relative humidity in percent.
    pub humidity_pct: u8,
}

/// Snapshot of the connection for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionSnapshot {
    /// Current provisioning state.
    pub state: ConnectionState,
    /// Station IP address, when connected.
    pub ip: Option<String>,
}

#[derive(Debug, Default)]
struct HubData {
    connection: ConnectionSnapshot,
    env: Option<EnvReading>,
    battery_volts: Option<f32>,
    rssi_dbm: Option<i8>,
    scans: ScanTracker,
}

/// Callback invoked whenever any provisioning-relevant data changes.
pub type UpdateCallback = Box<dyn Fn() + Send + Sync>;

/// Shared, mutexed status board for UI collaborators.
#[derive(Default)]
pub struct StatusHub {
    data: Mutex<HubData>,
    on_update: Mutex<Option<UpdateCallback>>,
}

impl StatusHub {
    /// Create a hub with everything unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single update callback, replacing any previous one.
    pub fn set_update_callback(&self, callback: UpdateCallback) {
        *self.on_update.lock().unwrap() = Some(callback);
    }

    fn notify(&self) {
        let guard = self.on_update.lock().unwrap();
        if let Some(callback) = guard.as_ref() {
            callback();
        }
    }

    // ==================== Provisioning side ====================

    /// Publish a new connection snapshot.
    ///
    /// `ip_change` is `None` to keep the current address, `Some(new)` to
    /// replace it (including clearing it with `Some(None)`).
    pub fn update_connection(&self, state: ConnectionState, ip_change: Option<Option<String>>) {
        {
            let mut data = self.data.lock().unwrap();
            data.connection.state = state;
            if let Some(ip) = ip_change {
                data.connection.ip = ip;
            }
        }
        self.notify();
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.data.lock().unwrap().connection.state
    }

    /// Current connection snapshot.
    pub fn connection(&self) -> ConnectionSnapshot {
        self.data.lock().unwrap().connection.clone()
    }

    // ==================== Scan side ====================

    /// Record a completed scan pass.
    pub fn record_scan(&self, outcome: ScanOutcome) {
        {
            let mut data = self.data.lock().unwrap();
            data.scans.record(outcome);
        }
        self.notify();
    }

    /// True once both the BLE and Wi-Fi passes have reported.
    pub fn scans_finished(&self) -> bool {
        self.data.lock().unwrap().scans.all_finished()
    }

    /// BLE sweep result, if finished.
    pub fn ble_summary(&self) -> Option<BleScanSummary> {
        self.data.lock().unwrap().scans.ble_summary()
    }

    /// Visible Wi-Fi network count, if finished.
    pub fn wifi_networks(&self) -> Option<u16> {
        self.data.lock().unwrap().scans.wifi_networks()
    }

    // ==================== External telemetry ====================

    /// Record an environment sample.
    pub fn set_env(&self, reading: EnvReading) {
        {
            self.data.lock().unwrap().env = Some(reading);
        }
        self.notify();
    }

    /// Latest environment sample.
    pub fn env(&self) -> Option<EnvReading> {
        self.data.lock().unwrap().env
    }

    /// Record the battery voltage.
    pub fn set_battery_volts(&self, volts: f32) {
        {
            self.data.lock().unwrap().battery_volts = Some(volts);
        }
        self.notify();
    }

    /// Latest battery voltage.
    pub fn battery_volts(&self) -> Option<f32> {
        self.data.lock().unwrap().battery_volts
    }

    /// Record the station link signal strength.
    pub fn set_rssi_dbm(&self, rssi: i8) {
        {
            self.data.lock().unwrap().rssi_dbm = Some(rssi);
        }
        self.notify();
    }

    /// Latest signal strength.
    pub fn rssi_dbm(&self) -> Option<i8> {
        self.data.lock().unwrap().rssi_dbm
    }
}
