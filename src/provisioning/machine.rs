//! Provisioning state machine.
//!
//! A pure transition function over an explicit event enum: each event
//! yields the side effects to perform as [`Action`] values, executed by
//! the [`manager`](crate::provisioning::manager). Keeping the machine free
//! of I/O makes every transition testable on the host.
//!
//! # States
//!
//! ```text
//! boot ──credentials──▶ ConnectingSta ──GotStationIp──▶ Connected
//!   │                      │  ▲                            │
//!   │ (none)               │  └── Disconnected (< MAX) ────┘
//!   ▼                      ▼
//! Unprovisioned       FallbackAp  (retry budget exhausted)
//!   └──────── CredentialsSubmitted ──▶ ConnectingSta
//! ```
//!
//! The retry counter is reset on every successful IP acquisition and on
//! entering `FallbackAp`; it is not persisted, so a reboot starts with a
//! fresh budget.

use crate::config::Credentials;
use log::debug;
use std::fmt;

/// Consecutive disconnects tolerated before falling back to the
/// configuration access point.
pub const MAX_RETRY: u8 = 5;

/// Connection lifecycle state, owned by the machine.
///
/// Read-only snapshots are published through the status hub for the UI
/// and the portal's submission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No valid credentials; configuration AP + portal active.
    #[default]
    Unprovisioned,
    /// Station connect in progress.
    ConnectingSta,
    /// Associated with an IP address.
    Connected,
    /// Reconnecting after a disconnect; carries the attempt count.
    Retrying(u8),
    /// Retry budget exhausted; back in configuration mode.
    FallbackAp,
}

impl ConnectionState {
    /// Whether the portal may accept a credential submission in this state.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, Self::Unprovisioned | Self::FallbackAp)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unprovisioned => write!(f, "unprovisioned"),
            Self::ConnectingSta => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Retrying(n) => write!(f, "retrying({})", n),
            Self::FallbackAp => write!(f, "fallback-ap"),
        }
    }
}

/// Events consumed by the machine.
///
/// Network-stack notifications arrive through a thin adapter at the system
/// boundary; `CredentialsSubmitted` is emitted by the portal's submission
/// hook after the pair has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The portal accepted and persisted a new credential pair.
    CredentialsSubmitted(Credentials),
    /// The station interface started.
    StationStarted,
    /// The station lost (or failed to establish) its association.
    StationDisconnected,
    /// The configuration access point is up.
    AccessPointStarted,
    /// DHCP completed; carries the assigned address.
    GotStationIp(String),
}

/// Side effects requested by a transition, executed by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Configure and start the station interface for these credentials.
    ConnectStation(Credentials),
    /// Issue the association attempt on the started station interface.
    Connect,
    /// Configure and start the SoftAP.
    StartAccessPoint,
    /// Start the portal server (no-op if already running).
    StartPortal,
    /// Stop the portal server (no-op if not running).
    StopPortal,
}

/// The provisioning state machine.
///
/// Mutated only through [`Machine::handle`]; the caller serializes events,
/// so transitions are atomic with respect to each other by construction.
#[derive(Debug)]
pub struct Machine {
    state: ConnectionState,
    retries: u8,
}

impl Machine {
    /// Decide the boot-time mode from the stored credentials.
    pub fn boot(stored: Option<Credentials>) -> (Self, Vec<Action>) {
        match stored {
            Some(creds) => (
                Self {
                    state: ConnectionState::ConnectingSta,
                    retries: 0,
                },
                vec![Action::ConnectStation(creds)],
            ),
            None => (
                Self {
                    state: ConnectionState::Unprovisioned,
                    retries: 0,
                },
                vec![Action::StartAccessPoint, Action::StartPortal],
            ),
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current retry count.
    pub fn retries(&self) -> u8 {
        self.retries
    }

    /// Process one event to completion, returning the actions to execute.
    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        use ConnectionState::*;

        match (self.state, event) {
            // Leaving configuration mode: the pair is already durable, so
            // the only work left is tearing down the portal and connecting.
            (Unprovisioned | FallbackAp, Event::CredentialsSubmitted(creds)) => {
                self.state = ConnectingSta;
                vec![Action::StopPortal, Action::ConnectStation(creds)]
            }

            (Unprovisioned | FallbackAp, Event::AccessPointStarted) => {
                vec![Action::StartPortal]
            }

            (ConnectingSta | Retrying(_), Event::StationStarted) => {
                vec![Action::Connect]
            }

            (ConnectingSta | Retrying(_), Event::GotStationIp(_)) => {
                self.retries = 0;
                self.state = Connected;
                vec![Action::StopPortal]
            }

            (ConnectingSta | Retrying(_), Event::StationDisconnected) => {
                self.retries += 1;
                if self.retries >= MAX_RETRY {
                    self.retries = 0;
                    self.state = FallbackAp;
                    vec![Action::StartAccessPoint, Action::StartPortal]
                } else {
                    self.state = Retrying(self.retries);
                    vec![Action::Connect]
                }
            }

            (Connected, Event::StationDisconnected) => {
                self.retries += 1;
                self.state = Retrying(self.retries);
                vec![Action::Connect]
            }

            (state, event) => {
                debug!("ignoring {:?} in state {}", event, state);
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("HomeNet", "secret123").unwrap()
    }

    fn booted_connecting() -> Machine {
        let (machine, _) = Machine::boot(Some(creds()));
        machine
    }

    // ==================== Boot ====================

    #[test]
    fn test_boot_with_credentials_connects() {
        let (machine, actions) = Machine::boot(Some(creds()));
        assert_eq!(machine.state(), ConnectionState::ConnectingSta);
        assert_eq!(actions, vec![Action::ConnectStation(creds())]);
    }

    #[test]
    fn test_boot_without_credentials_opens_portal() {
        let (machine, actions) = Machine::boot(None);
        assert_eq!(machine.state(), ConnectionState::Unprovisioned);
        assert_eq!(actions, vec![Action::StartAccessPoint, Action::StartPortal]);
    }

    // ==================== Submission ====================

    #[test]
    fn test_submission_leaves_unprovisioned() {
        let (mut machine, _) = Machine::boot(None);
        let actions = machine.handle(Event::CredentialsSubmitted(creds()));
        assert_eq!(machine.state(), ConnectionState::ConnectingSta);
        assert_eq!(
            actions,
            vec![Action::StopPortal, Action::ConnectStation(creds())]
        );
    }

    #[test]
    fn test_submission_ignored_while_connecting() {
        let mut machine = booted_connecting();
        let actions = machine.handle(Event::CredentialsSubmitted(creds()));
        assert!(actions.is_empty());
        assert_eq!(machine.state(), ConnectionState::ConnectingSta);
    }

    #[test]
    fn test_station_started_triggers_connect() {
        let mut machine = booted_connecting();
        assert_eq!(machine.handle(Event::StationStarted), vec![Action::Connect]);
        assert_eq!(machine.state(), ConnectionState::ConnectingSta);
    }

    // ==================== Retry budget ====================

    #[test]
    fn test_disconnect_below_budget_retries() {
        let mut machine = booted_connecting();
        let actions = machine.handle(Event::StationDisconnected);
        assert_eq!(actions, vec![Action::Connect]);
        assert_eq!(machine.state(), ConnectionState::Retrying(1));
        assert_eq!(machine.retries(), 1);
    }

    #[test]
    fn test_five_disconnects_fall_back_exactly_once() {
        let mut machine = booted_connecting();

        for expected in 1..MAX_RETRY {
            machine.handle(Event::StationDisconnected);
            assert_eq!(machine.state(), ConnectionState::Retrying(expected));
        }

        let actions = machine.handle(Event::StationDisconnected);
        assert_eq!(machine.state(), ConnectionState::FallbackAp);
        assert_eq!(machine.retries(), 0, "counter resets on fallback entry");
        assert_eq!(
            actions,
            vec![Action::StartAccessPoint, Action::StartPortal]
        );
    }

    #[test]
    fn test_disconnect_after_fallback_is_ignored() {
        let mut machine = booted_connecting();
        for _ in 0..MAX_RETRY {
            machine.handle(Event::StationDisconnected);
        }
        assert_eq!(machine.state(), ConnectionState::FallbackAp);

        // A 6th disconnect must not re-exhaust or transition anything
        let actions = machine.handle(Event::StationDisconnected);
        assert!(actions.is_empty());
        assert_eq!(machine.state(), ConnectionState::FallbackAp);
    }

    #[test]
    fn test_session_after_fallback_starts_fresh() {
        let mut machine = booted_connecting();
        for _ in 0..MAX_RETRY {
            machine.handle(Event::StationDisconnected);
        }

        machine.handle(Event::CredentialsSubmitted(creds()));
        assert_eq!(machine.state(), ConnectionState::ConnectingSta);

        machine.handle(Event::StationDisconnected);
        assert_eq!(machine.state(), ConnectionState::Retrying(1));
    }

    // ==================== IP acquisition ====================

    #[test]
    fn test_got_ip_resets_retry_counter() {
        let mut machine = booted_connecting();
        machine.handle(Event::StationDisconnected);
        machine.handle(Event::StationDisconnected);
        assert_eq!(machine.retries(), 2);

        let actions = machine.handle(Event::GotStationIp("192.168.1.40".into()));
        assert_eq!(machine.state(), ConnectionState::Connected);
        assert_eq!(machine.retries(), 0);
        assert_eq!(actions, vec![Action::StopPortal]);
    }

    #[test]
    fn test_disconnect_while_connected_retries() {
        let mut machine = booted_connecting();
        machine.handle(Event::GotStationIp("10.0.0.2".into()));

        let actions = machine.handle(Event::StationDisconnected);
        assert_eq!(machine.state(), ConnectionState::Retrying(1));
        assert_eq!(actions, vec![Action::Connect]);
    }

    #[test]
    fn test_transient_blips_do_not_erode_budget() {
        let mut machine = booted_connecting();

        // Each blip: one disconnect, then a successful reconnect
        for _ in 0..10 {
            machine.handle(Event::StationDisconnected);
            machine.handle(Event::GotStationIp("10.0.0.2".into()));
        }
        assert_eq!(machine.state(), ConnectionState::Connected);
        assert_eq!(machine.retries(), 0);
    }

    // ==================== Portal re-arm ====================

    #[test]
    fn test_ap_started_rearms_portal() {
        let (mut machine, _) = Machine::boot(None);
        assert_eq!(
            machine.handle(Event::AccessPointStarted),
            vec![Action::StartPortal]
        );
    }

    #[test]
    fn test_ap_started_ignored_while_connected() {
        let mut machine = booted_connecting();
        machine.handle(Event::GotStationIp("10.0.0.2".into()));
        assert!(machine.handle(Event::AccessPointStarted).is_empty());
    }

    // ==================== Display ====================

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Unprovisioned.to_string(), "unprovisioned");
        assert_eq!(ConnectionState::Retrying(3).to_string(), "retrying(3)");
        assert_eq!(ConnectionState::FallbackAp.to_string(), "fallback-ap");
    }

    #[test]
    fn test_accepts_submissions() {
        assert!(ConnectionState::Unprovisioned.accepts_submissions());
        assert!(ConnectionState::FallbackAp.accepts_submissions());
        assert!(!ConnectionState::ConnectingSta.accepts_submissions());
        assert!(!ConnectionState::Connected.accepts_submissions());
        assert!(!ConnectionState::Retrying(1).accepts_submissions());
    }
}
