//! One-shot BLE discovery scan.
//!
//! Runs an active scan for a fixed duration on its own worker thread,
//! deduplicating advertisements by hardware address and counting devices
//! that advertise a readable name. The worker reports a single
//! [`ScanOutcome`] to the status hub and exits; there is no cancellation.

use super::adv::extract_local_name;
use crate::discovery::{
    BdAddr, BleScanSummary, DiscoveredDeviceSet, ScanOutcome, BLE_SCAN_DURATION_MS,
};
use crate::status::StatusHub;
use esp32_nimble::{BLEDevice, BLEScan};
use esp_idf_svc::hal::task::block_on;
use log::{info, warn};
use std::sync::Arc;
use std::thread;

/// Spawn the one-shot BLE scan worker.
///
/// The thread runs the scan to completion, records the outcome on the
/// hub, and terminates.
pub fn spawn_ble_scan(hub: Arc<StatusHub>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let summary = run_scan();
        info!(
            "BLE scan complete: {} devices ({} named)",
            summary.devices, summary.named
        );
        hub.record_scan(ScanOutcome::Ble(summary));
    })
}

fn run_scan() -> BleScanSummary {
    let device = BLEDevice::take();
    let mut scan = BLEScan::new();
    scan.active_scan(true).interval(100).window(99);

    let mut session = DiscoveredDeviceSet::new();
    let mut named: u16 = 0;

    let result = block_on(scan.start(
        device,
        BLE_SCAN_DURATION_MS as i32,
        |advertised, data| {
            let addr: BdAddr = advertised.addr().val().to_owned();
            if session.observe(addr) && extract_local_name(data.payload()).is_some() {
                named = named.saturating_add(1);
            }
            // Keep scanning for the full duration
            None::<()>
        },
    ));

    if let Err(e) = result {
        warn!("BLE scan failed: {:?}", e);
    }

    BleScanSummary {
        devices: session.observed(),
        named,
    }
}
