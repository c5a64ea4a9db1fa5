//! Provisioning orchestrator.
//!
//! [`ProvisioningManager`] owns every piece of mutable provisioning state:
//! the state machine, the radio, the shared credential store, the portal
//! handle, and the status hub. All mutation funnels through
//! [`handle_event`](ProvisioningManager::handle_event), which the caller
//! invokes from a single event-loop thread; the portal and the network
//! stack only ever `send` into that loop.
//!
//! The portal handle invariant is enforced here: the server exists iff
//! the machine is in an AP-bearing state (started on entry, stopped on
//! exit, idempotently in both directions).

use super::machine::{Action, ConnectionState, Event, Machine};
use crate::config::Credentials;
use crate::discovery::ScanOutcome;
use crate::persistence::CredentialStore;
use crate::portal::{PortalServer, SubmitError, SubmitHandler};
use crate::status::StatusHub;
use crate::wifi::WifiControl;
use log::{error, info, warn};
use std::sync::{mpsc, Arc, Mutex};

/// Single owner of the provisioning subsystem.
pub struct ProvisioningManager<S, W>
where
    S: CredentialStore + Send + 'static,
    W: WifiControl,
{
    machine: Machine,
    radio: W,
    store: Arc<Mutex<S>>,
    hub: Arc<StatusHub>,
    events: mpsc::Sender<Event>,
    portal: Option<PortalServer>,
    portal_port: u16,
}

impl<S, W> ProvisioningManager<S, W>
where
    S: CredentialStore + Send + 'static,
    W: WifiControl,
{
    /// Boot the subsystem: consult the store and enter either station
    /// mode or configuration mode.
    pub fn boot(
        radio: W,
        store: Arc<Mutex<S>>,
        hub: Arc<StatusHub>,
        events: mpsc::Sender<Event>,
        portal_port: u16,
    ) -> Self {
        let stored = store.lock().unwrap().load();
        match &stored {
            Some(creds) => info!("Provisioned: yes ('{}')", creds.ssid()),
            None => info!("Provisioned: no"),
        }

        let (machine, actions) = Machine::boot(stored);
        let mut manager = Self {
            machine,
            radio,
            store,
            hub,
            events,
            portal: None,
            portal_port,
        };

        manager
            .hub
            .update_connection(manager.machine.state(), Some(None));
        for action in actions {
            manager.run_action(action);
        }
        manager
    }

    /// Current machine state.
    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    /// Whether the portal server is currently running.
    pub fn portal_active(&self) -> bool {
        self.portal.is_some()
    }

    /// Process one event to completion.
    pub fn handle_event(&mut self, event: Event) {
        let ip_change = match &event {
            Event::GotStationIp(ip) => Some(Some(ip.clone())),
            Event::StationDisconnected => Some(None),
            _ => None,
        };

        let before = self.machine.state();
        let actions = self.machine.handle(event);

        if self.machine.state() != before || ip_change.is_some() {
            self.hub.update_connection(self.machine.state(), ip_change);
        }

        for action in actions {
            self.run_action(action);
        }
    }

    /// Run the one-shot Wi-Fi scan pass and report it to the hub.
    ///
    /// Call once from the initialization context, before event dispatch
    /// begins. A radio in a mode that cannot scan reports zero networks.
    pub fn run_network_scan(&mut self) {
        let count = match self.radio.network_scan_count() {
            Ok(count) => count,
            Err(e) => {
                warn!("Wi-Fi scan failed: {}", e);
                0
            }
        };
        info!("Wi-Fi scan found {} networks", count);
        self.hub.record_scan(ScanOutcome::WifiNetworks(count));
    }

    fn run_action(&mut self, action: Action) {
        match action {
            Action::ConnectStation(creds) => {
                if let Err(e) = self.radio.start_station(&creds) {
                    error!("Failed to start station: {}", e);
                    self.synthesize_disconnect();
                }
            }
            Action::Connect => {
                if let Err(e) = self.radio.connect() {
                    error!("Connect attempt failed: {}", e);
                    self.synthesize_disconnect();
                }
            }
            Action::StartAccessPoint => {
                if let Err(e) = self.radio.start_access_point() {
                    error!("Failed to start access point: {}", e);
                }
            }
            Action::StartPortal => self.start_portal(),
            Action::StopPortal => self.stop_portal(),
        }
    }

    /// Feed a radio command failure back through the serialized event
    /// path so it consumes retry budget like any other link failure.
    fn synthesize_disconnect(&self) {
        if self.events.send(Event::StationDisconnected).is_err() {
            warn!("Event channel closed; dropping radio failure");
        }
    }

    /// Start the portal if it is not already running.
    fn start_portal(&mut self) {
        if self.portal.is_some() {
            return;
        }
        match PortalServer::start(self.portal_port, self.submit_handler()) {
            Ok(server) => self.portal = Some(server),
            Err(e) => error!("Failed to start portal: {}", e),
        }
    }

    /// Stop the portal if it is running.
    fn stop_portal(&mut self) {
        if let Some(mut server) = self.portal.take() {
            server.stop();
        }
    }

    /// Build the portal's submission hook.
    ///
    /// Credentials must be durable before `CredentialsSubmitted` is
    /// emitted, so a later unexpected reboot still has them; a storage
    /// failure is surfaced to the HTTP client and changes nothing here.
    fn submit_handler(&self) -> SubmitHandler {
        let hub = self.hub.clone();
        let store = self.store.clone();
        let events = self.events.clone();

        Arc::new(move |creds: Credentials| {
            if !hub.connection_state().accepts_submissions() {
                return Err(SubmitError::NotAccepting);
            }
            store
                .lock()
                .unwrap()
                .save(&creds)
                .map_err(SubmitError::Storage)?;
            events
                .send(Event::CredentialsSubmitted(creds))
                .map_err(|_| SubmitError::ChannelClosed)
        })
    }
}
