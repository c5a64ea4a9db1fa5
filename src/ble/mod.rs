//! BLE discovery components.
//!
//! # Components
//!
//! - [`adv`] - advertising-data name extraction (host-testable)
//! - [`scan`] - one-shot scan worker over the NimBLE stack (ESP32 only)

pub mod adv;

#[cfg(feature = "esp32")]
pub mod scan;

pub use adv::extract_local_name;
