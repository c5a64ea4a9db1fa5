//! Simulated radio for host runs.
//!
//! Lets the full provisioning loop (portal included) run on a development
//! machine: every radio command succeeds and the corresponding
//! network-stack notification is fed straight back into the event channel.

use super::{WifiControl, WifiError, AP_SSID};
use crate::config::Credentials;
use crate::provisioning::Event;
use log::info;
use std::sync::mpsc;

/// Address reported by the simulated DHCP exchange.
const SIMULATED_IP: &str = "192.168.1.42";

/// A radio whose hardware is imaginary.
pub struct HostRadio {
    events: mpsc::Sender<Event>,
}

impl HostRadio {
    /// Create a simulator feeding `events`.
    pub fn new(events: mpsc::Sender<Event>) -> Self {
        Self { events }
    }

    fn emit(&self, event: Event) -> Result<(), WifiError> {
        self.events
            .send(event)
            .map_err(|_| WifiError::Driver("event channel closed".into()))
    }
}

impl WifiControl for HostRadio {
    fn start_station(&mut self, creds: &Credentials) -> Result<(), WifiError> {
        info!("[sim] station up for '{}'", creds.ssid());
        self.emit(Event::StationStarted)
    }

    fn connect(&mut self) -> Result<(), WifiError> {
        info!("[sim] associated, ip {}", SIMULATED_IP);
        self.emit(Event::GotStationIp(SIMULATED_IP.to_string()))
    }

    fn start_access_point(&mut self) -> Result<(), WifiError> {
        info!("[sim] access point '{}' up", AP_SSID);
        self.emit(Event::AccessPointStarted)
    }

    fn network_scan_count(&mut self) -> Result<u16, WifiError> {
        // No radio, no networks
        Ok(0)
    }
}
