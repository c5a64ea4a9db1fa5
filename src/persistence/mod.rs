//! Credential persistence.
//!
//! Durable storage of the single provisioned (SSID, password) pair. The
//! [`CredentialStore`] trait is the seam between the provisioning manager
//! and the storage backend: NVS on the device, an in-memory store on the
//! host and in tests.
//!
//! Load/save are all-or-nothing from the caller's point of view: `load`
//! never returns a partially populated pair, and a failed `save` leaves the
//! previous pair in place for a retry.

use crate::config::Credentials;
use std::fmt;

#[cfg(feature = "esp32")]
mod nvs;

#[cfg(feature = "esp32")]
pub use nvs::NvsCredentialStore;

/// Durable storage for the provisioned credential pair.
pub trait CredentialStore {
    /// Load the persisted credentials.
    ///
    /// Returns `None` if nothing is stored, either key is missing, or the
    /// stored SSID is empty. A `Some` result is fully valid for a
    /// connection attempt.
    fn load(&self) -> Option<Credentials>;

    /// Persist a credential pair, overwriting any previous one wholesale.
    fn save(&mut self, creds: &Credentials) -> Result<(), StorageError>;
}

/// Errors that can occur during credential persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A low-level write or commit failed. Fatal to this save attempt,
    /// not to the process; the caller may retry.
    WriteFailed(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed(detail) => write!(f, "storage write failed: {}", detail),
        }
    }
}

impl std::error::Error for StorageError {}

/// In-memory credential store for host runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    creds: Option<Credentials>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with credentials.
    pub fn with_credentials(creds: Credentials) -> Self {
        Self { creds: Some(creds) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credentials> {
        self.creds.clone()
    }

    fn save(&mut self, creds: &Credentials) -> Result<(), StorageError> {
        self.creds = Some(creds.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_loads_none() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut store = MemoryCredentialStore::new();
        let creds = Credentials::new("HomeNet", "secret123").unwrap();
        store.save(&creds).unwrap();
        assert_eq!(store.load(), Some(creds));
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let first = Credentials::new("OldNet", "oldpass99").unwrap();
        let mut store = MemoryCredentialStore::with_credentials(first);

        let second = Credentials::open("NewNet").unwrap();
        store.save(&second).unwrap();
        assert_eq!(store.load(), Some(second));
    }

    #[test]
    fn test_open_network_roundtrip() {
        let mut store = MemoryCredentialStore::new();
        let creds = Credentials::open("CoffeeShop").unwrap();
        store.save(&creds).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.is_open());
        assert_eq!(loaded.ssid(), "CoffeeShop");
    }
}
