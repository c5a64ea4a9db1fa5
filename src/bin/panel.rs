//! Smart-home panel firmware entry point.
//!
//! Runs on both ESP32 and host platforms:
//! - **Host**: `cargo run --bin panel` (simulated radio, portal on :8080)
//! - **ESP32**: `cargo espflash flash --bin panel --features esp32 --release`
//!
//! Boot sequence: consult the credential store, enter station or
//! configuration mode, run the one-shot discovery scans, then dispatch
//! network and portal events on a single serialized loop.

use log::{debug, info};
use smarthome_esp32::provisioning::ProvisioningManager;
use smarthome_esp32::status::StatusHub;
use std::sync::{mpsc, Arc, Mutex};

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() {
    platform_init();

    info!("=== SmartHome panel starting ===");

    #[cfg(feature = "esp32")]
    info!("Platform: ESP32");
    #[cfg(not(feature = "esp32"))]
    info!("Platform: Host");

    run();
}

#[cfg(feature = "esp32")]
fn run() {
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use smarthome_esp32::ble::scan::spawn_ble_scan;
    use smarthome_esp32::persistence::NvsCredentialStore;
    use smarthome_esp32::portal::PORTAL_PORT;
    use smarthome_esp32::wifi::connection::{subscribe_network_events, WifiRadio};

    // Startup resource acquisition is the one place allowed to abort
    let peripherals = Peripherals::take().expect("peripherals already taken");
    let sysloop = EspSystemEventLoop::take().expect("failed to take system event loop");
    let nvs = EspDefaultNvsPartition::take().expect("failed to take NVS partition");

    let (tx, rx) = mpsc::channel();
    let _subscriptions = subscribe_network_events(&sysloop, tx.clone())
        .expect("failed to subscribe to network events");

    let store = Arc::new(Mutex::new(
        NvsCredentialStore::new(nvs.clone()).expect("failed to open credential store"),
    ));

    let hub = Arc::new(StatusHub::new());
    let hub_for_display = hub.clone();
    hub.set_update_callback(Box::new(move || {
        // Display refresh hook for the UI layer
        debug!("status changed: {}", hub_for_display.connection_state());
    }));

    let radio = WifiRadio::new(peripherals.modem, sysloop.clone(), nvs)
        .expect("failed to create WiFi driver");

    let mut manager = ProvisioningManager::boot(radio, store, hub.clone(), tx, PORTAL_PORT);

    // One-shot discovery pass: BLE on its own worker, Wi-Fi inline on the
    // initialization context
    let _ble_worker = spawn_ble_scan(hub.clone());
    manager.run_network_scan();

    // Serialized event dispatch: one event processed to completion before
    // the next
    while let Ok(event) = rx.recv() {
        manager.handle_event(event);
    }
}

#[cfg(not(feature = "esp32"))]
fn run() {
    use smarthome_esp32::discovery::{BleScanSummary, ScanOutcome};
    use smarthome_esp32::persistence::MemoryCredentialStore;
    use smarthome_esp32::wifi::host::HostRadio;

    /// Portal port for host runs (binding 80 needs privileges).
    const HOST_PORTAL_PORT: u16 = 8080;

    let (tx, rx) = mpsc::channel();
    let store = Arc::new(Mutex::new(MemoryCredentialStore::new()));

    let hub = Arc::new(StatusHub::new());
    let hub_for_display = hub.clone();
    hub.set_update_callback(Box::new(move || {
        debug!("status changed: {}", hub_for_display.connection_state());
    }));

    let radio = HostRadio::new(tx.clone());
    let mut manager =
        ProvisioningManager::boot(radio, store, hub.clone(), tx, HOST_PORTAL_PORT);

    // No BLE hardware on the host; report an empty sweep so the combined
    // scan condition still completes
    hub.record_scan(ScanOutcome::Ble(BleScanSummary::default()));
    manager.run_network_scan();

    info!(
        "Submit credentials at http://127.0.0.1:{}/",
        HOST_PORTAL_PORT
    );

    while let Ok(event) = rx.recv() {
        manager.handle_event(event);
    }
}
