//! Wi-Fi credential types.
//!
//! Platform-independent credential validation that can be tested on the
//! host machine. The SSID/password length bounds live here so oversized
//! input is rejected at the boundary instead of being truncated later.
//!
//! # Example
//!
//! ```
//! use smarthome_esp32::config::Credentials;
//!
//! let creds = Credentials::new("HomeNet", "secret123").unwrap();
//! assert_eq!(creds.ssid(), "HomeNet");
//! assert!(!creds.is_open());
//! ```

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Wi-Fi credentials for joining an access point.
///
/// A credential pair is valid iff the SSID is non-empty; the password may
/// be empty (open network). Fields are private so every instance satisfies
/// the length bounds. The password is zeroed when the value is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    /// Network SSID (1-32 bytes).
    ssid: String,
    /// Network password (0-64 bytes; empty for open networks).
    password: String,
}

impl Credentials {
    /// Create a new credential pair, validating the length bounds.
    pub fn new(
        ssid: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let ssid = ssid.into();
        let password = password.into();

        if ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: ssid.len(),
                max: MAX_SSID_LEN,
            });
        }
        if password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(Self { ssid, password })
    }

    /// Create credentials for an open network (no password).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// The network SSID.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// The network password (empty for open networks).
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Errors that can occur while constructing credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
