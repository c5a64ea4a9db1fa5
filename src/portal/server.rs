//! Captive-portal HTTP server.
//!
//! Serves the configuration form and accepts one credential submission.
//! Uses `tiny_http`, which works on both host and ESP32 (via `std::net`).
//! The server runs in a background thread and polls a shutdown flag, so it
//! tolerates being stopped while a request is mid-flight.
//!
//! Lifecycle is owned by the provisioning manager: started on entry to an
//! AP-bearing state, stopped on exit, one instance at a time.

use super::form::{parse_credentials_form, FormError};
use crate::config::{ConfigError, Credentials};
use crate::persistence::StorageError;
use log::{error, info, warn};
use std::fmt;
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Method, Response, Server};

/// Port the portal binds on the device (clients land on 192.168.4.1:80).
pub const PORTAL_PORT: u16 = 80;

/// Upper bound on an accepted form body. The largest legal submission is
/// well under this even with every byte percent-encoded.
const MAX_FORM_BODY: usize = 512;

/// Configuration form served on `GET /`.
const PAGE_FORM: &str = "<html><head><title>Wi-Fi Setup</title></head><body>\
<h2>SmartHome Panel Setup</h2>\
<form method=\"POST\" action=\"/config\">\
SSID:<br><input name=\"ssid\" maxlength=\"32\"><br>\
Password:<br><input name=\"password\" type=\"password\" maxlength=\"64\"><br><br>\
<input type=\"submit\" value=\"Connect\">\
</form></body></html>";

/// Success page for an accepted submission.
const PAGE_SAVED: &str = "Configuration saved, connecting...";

/// Outcome of handing a decoded submission to the provisioning side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The machine is not in a state that accepts submissions.
    NotAccepting,
    /// Persisting the pair failed; the portal stays up for a retry.
    Storage(StorageError),
    /// The event channel to the manager is gone.
    ChannelClosed,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAccepting => write!(f, "not accepting configuration"),
            Self::Storage(e) => write!(f, "{}", e),
            Self::ChannelClosed => write!(f, "event channel closed"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Hook invoked with each successfully parsed submission.
///
/// The provisioning manager supplies a closure that checks the current
/// state, persists the pair, and enqueues `CredentialsSubmitted`. Only an
/// `Ok` return produces a 200 response.
pub type SubmitHandler = Arc<dyn Fn(Credentials) -> Result<(), SubmitError> + Send + Sync>;

/// The captive-portal HTTP server.
///
/// Dropping the handle stops the server and joins its thread.
pub struct PortalServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

impl PortalServer {
    /// Bind the portal and start serving in a background thread.
    pub fn start(port: u16, on_submit: SubmitHandler) -> Result<Self, std::io::Error> {
        let addr = format!("0.0.0.0:{}", port);
        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("Portal listening on http://{}/", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, on_submit, shutdown_clone);
        });

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    fn run_server(server: Server, on_submit: SubmitHandler, shutdown: Arc<AtomicBool>) {
        let html = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..])
            .expect("static header");
        let text = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/plain"[..])
            .expect("static header");

        loop {
            // Acquire pairs with the Release store in stop()
            if shutdown.load(Ordering::Acquire) {
                info!("Portal shutting down");
                break;
            }

            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(mut request)) => {
                    let method = request.method().clone();
                    let url = request.url().to_string();
                    let response = match (method, url.as_str()) {
                        (Method::Get, "/") => {
                            Response::from_string(PAGE_FORM).with_header(html.clone())
                        }
                        (Method::Post, "/config") => {
                            let outcome = Self::handle_config(&mut request, &on_submit);
                            let (status, body) = match outcome {
                                Ok(()) => (200, PAGE_SAVED.to_string()),
                                Err(status_body) => status_body,
                            };
                            Response::from_string(body)
                                .with_status_code(status)
                                .with_header(text.clone())
                        }
                        (Method::Get, "/config") | (Method::Post, "/") => {
                            Response::from_string("Method Not Allowed")
                                .with_status_code(405)
                                .with_header(text.clone())
                        }
                        _ => Response::from_string("Not Found")
                            .with_status_code(404)
                            .with_header(text.clone()),
                    };

                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send portal response: {}", e);
                    }
                }
                Ok(None) => {
                    // Timeout, check shutdown flag and continue
                }
                Err(e) => {
                    error!("Portal server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Process a `POST /config` request body.
    ///
    /// Returns the error status code and body on any rejection.
    fn handle_config(
        request: &mut tiny_http::Request,
        on_submit: &SubmitHandler,
    ) -> Result<(), (u16, String)> {
        let mut body = String::new();
        let reader = request.as_reader();
        if let Err(e) = reader
            .take(MAX_FORM_BODY as u64)
            .read_to_string(&mut body)
        {
            warn!("Unreadable portal submission: {}", e);
            return Err((400, "Invalid form".to_string()));
        }

        let creds = parse_credentials_form(&body).map_err(|e| {
            warn!("Rejected portal submission: {}", e);
            let message = match e {
                FormError::EmptyBody => "Empty body",
                FormError::MissingField(_) | FormError::InvalidEncoding => "Invalid form",
                FormError::InvalidCredentials(ConfigError::SsidEmpty) => "SSID required",
                FormError::InvalidCredentials(_) => "Invalid form",
            };
            (400, message.to_string())
        })?;

        info!("Portal received credentials for '{}'", creds.ssid());

        on_submit(creds).map_err(|e| match e {
            SubmitError::NotAccepting => (409, "Not accepting configuration".to_string()),
            SubmitError::Storage(e) => {
                error!("Failed to persist submitted credentials: {}", e);
                (500, "Failed to save configuration".to_string())
            }
            SubmitError::ChannelClosed => (500, "Provisioning unavailable".to_string()),
        })
    }

    /// Stop the server.
    ///
    /// Note: may take up to 100ms due to the polling interval.
    pub fn stop(&mut self) {
        // Release pairs with the Acquire load in the server thread
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PortalServer {
    fn drop(&mut self) {
        self.stop();
    }
}
