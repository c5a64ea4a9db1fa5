//! ESP-IDF Wi-Fi adapter.
//!
//! Wraps the `EspWifi` driver behind [`WifiControl`] and maps the
//! ESP-IDF event stream onto the crate's [`Event`] enum. The manager
//! stays event-driven: `start_station`/`start_access_point` only configure
//! and start the interface; association and IP acquisition are reported
//! back through the system event loop.

use super::{WifiControl, WifiError, AP_CHANNEL, AP_MAX_CONNECTIONS, AP_PASSWORD, AP_SSID};
use crate::config::Credentials;
use crate::provisioning::Event;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent,
};
use esp_idf_sys::EspError;
use log::{info, warn};
use std::sync::mpsc;

/// Wi-Fi radio adapter over the ESP-IDF driver.
pub struct WifiRadio<'a> {
    wifi: EspWifi<'a>,
}

impl<'a> WifiRadio<'a> {
    /// Create the radio, registering it with the system event loop.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
        Ok(Self { wifi })
    }

    fn restart_with(&mut self, config: &Configuration) -> Result<(), WifiError> {
        // Mode changes require a stopped driver; ignore "not started"
        let _ = self.wifi.stop();
        self.wifi
            .set_configuration(config)
            .map_err(|e| WifiError::Driver(e.to_string()))?;
        self.wifi
            .start()
            .map_err(|e| WifiError::Driver(e.to_string()))?;
        Ok(())
    }
}

impl WifiControl for WifiRadio<'_> {
    fn start_station(&mut self, creds: &Credentials) -> Result<(), WifiError> {
        info!("Starting station for '{}'", creds.ssid());

        let auth_method = if creds.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let config = Configuration::Client(ClientConfiguration {
            ssid: creds.ssid().try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: creds
                .password()
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        self.restart_with(&config)
    }

    fn connect(&mut self) -> Result<(), WifiError> {
        self.wifi
            .connect()
            .map_err(|e| WifiError::Driver(e.to_string()))
    }

    fn start_access_point(&mut self) -> Result<(), WifiError> {
        info!("Starting configuration access point '{}'", AP_SSID);

        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: AP_SSID.try_into().map_err(|_| WifiError::InvalidSsid)?,
            password: AP_PASSWORD
                .try_into()
                .map_err(|_| WifiError::InvalidPassword)?,
            channel: AP_CHANNEL,
            max_connections: AP_MAX_CONNECTIONS,
            auth_method: AuthMethod::WPA2Personal,
            ..Default::default()
        });

        self.restart_with(&config)
    }

    fn network_scan_count(&mut self) -> Result<u16, WifiError> {
        // Scanning needs a station interface; AP-only mode reports zero
        match self.wifi.get_configuration() {
            Ok(Configuration::Client(_)) | Ok(Configuration::Mixed(_, _)) => {}
            _ => return Ok(0),
        }

        let networks = self
            .wifi
            .driver_mut()
            .scan()
            .map_err(|e| WifiError::Driver(e.to_string()))?;
        Ok(networks.len() as u16)
    }
}

/// Subscribe to the network stack and forward provisioning-relevant
/// notifications into the manager's event channel.
///
/// The returned subscriptions must be kept alive for the callbacks to
/// keep firing.
pub fn subscribe_network_events(
    sysloop: &EspSystemEventLoop,
    events: mpsc::Sender<Event>,
) -> Result<
    (
        EspSubscription<'static, System>,
        EspSubscription<'static, System>,
    ),
    EspError,
> {
    let wifi_events = events.clone();
    let wifi_sub = sysloop.subscribe::<WifiEvent, _>(move |event| {
        let mapped = match event {
            WifiEvent::StaStarted => Some(Event::StationStarted),
            WifiEvent::StaDisconnected(_) => Some(Event::StationDisconnected),
            WifiEvent::ApStarted => Some(Event::AccessPointStarted),
            _ => None,
        };
        if let Some(event) = mapped {
            if wifi_events.send(event).is_err() {
                warn!("Provisioning event loop is gone");
            }
        }
    })?;

    let ip_sub = sysloop.subscribe::<IpEvent, _>(move |event| {
        if let IpEvent::DhcpIpAssigned(assignment) = event {
            let ip = assignment.ip().to_string();
            if events.send(Event::GotStationIp(ip)).is_err() {
                warn!("Provisioning event loop is gone");
            }
        }
    })?;

    Ok((wifi_sub, ip_sub))
}
