//! Captive portal for credential entry.
//!
//! # Components
//!
//! - [`form`] - URL-encoded form decoding and validation (host-testable)
//! - [`server`] - the `tiny_http` server bound 1:1 to access-point mode

pub mod form;
pub mod server;

pub use form::{parse_credentials_form, url_decode, FormError};
pub use server::{PortalServer, SubmitError, SubmitHandler, PORTAL_PORT};
