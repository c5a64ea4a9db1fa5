//! NVS persistence for Wi-Fi credentials.
//!
//! Stores the credential pair in ESP32 Non-Volatile Storage so it survives
//! reboots. Layout: one namespace with two string keys, read and written
//! wholesale.

use super::{CredentialStore, StorageError};
use crate::config::{Credentials, MAX_PASSWORD_LEN, MAX_SSID_LEN};
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_sys::EspError;

/// NVS namespace for Wi-Fi provisioning.
const NVS_NAMESPACE: &str = "wifi_cfg";

/// NVS key for the stored SSID.
const KEY_SSID: &str = "ssid";

/// NVS key for the stored password.
const KEY_PASS: &str = "pass";

/// Credential store backed by an NVS namespace.
pub struct NvsCredentialStore {
    nvs: EspNvs<NvsDefault>,
}

impl NvsCredentialStore {
    /// Open (creating if needed) the provisioning namespace on the given
    /// partition.
    pub fn new(partition: EspNvsPartition<NvsDefault>) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        Ok(Self { nvs })
    }
}

impl CredentialStore for NvsCredentialStore {
    fn load(&self) -> Option<Credentials> {
        // get_str needs room for the NUL terminator
        let mut ssid_buf = [0u8; MAX_SSID_LEN + 1];
        let mut pass_buf = [0u8; MAX_PASSWORD_LEN + 1];

        let ssid = self.nvs.get_str(KEY_SSID, &mut ssid_buf).ok()??;
        let password = self.nvs.get_str(KEY_PASS, &mut pass_buf).ok()??;

        if ssid.is_empty() {
            return None;
        }

        // A stored pair that no longer satisfies the bounds is treated as
        // absent, same as a missing key.
        Credentials::new(ssid, password).ok()
    }

    fn save(&mut self, creds: &Credentials) -> Result<(), StorageError> {
        // Password first: a torn save must not leave a new SSID paired
        // with an old password.
        self.nvs
            .set_str(KEY_PASS, creds.password())
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        self.nvs
            .set_str(KEY_SSID, creds.ssid())
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}
