//! URL-encoded form parsing for the captive portal.
//!
//! The portal accepts exactly one body shape:
//! `ssid=<encoded>&password=<encoded>`. Both field markers must be present
//! as literal substrings; values are percent/`+`-decoded and validated
//! against the credential length bounds. Oversized or empty-SSID input is
//! rejected here, at the boundary, never truncated.

use crate::config::{ConfigError, Credentials};
use std::fmt;

/// Decode a URL-encoded form value.
///
/// `%XX` becomes the raw byte, `+` becomes a space, and everything else
/// (including malformed `%` escapes) is copied through verbatim. Decoding
/// plain input is the identity.
pub fn url_decode(input: &str) -> Result<String, FormError> {
    let src = input.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match hex_pair(src.get(i + 1).copied(), src.get(i + 2).copied()) {
                Some(byte) => {
                    out.push(byte);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|_| FormError::InvalidEncoding)
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = (hi? as char).to_digit(16)? as u8;
    let lo = (lo? as char).to_digit(16)? as u8;
    Some(hi << 4 | lo)
}

/// Parse a `POST /config` body into a validated credential pair.
pub fn parse_credentials_form(body: &str) -> Result<Credentials, FormError> {
    if body.is_empty() {
        return Err(FormError::EmptyBody);
    }

    let ssid_enc = field_value(body, "ssid=").ok_or(FormError::MissingField("ssid"))?;
    let pass_enc =
        field_value(body, "password=").ok_or(FormError::MissingField("password"))?;

    let ssid = url_decode(ssid_enc)?;
    let password = url_decode(pass_enc)?;

    Credentials::new(ssid, password).map_err(FormError::InvalidCredentials)
}

/// Extract the raw value following `marker`, up to the next `&`.
fn field_value<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    let start = body.find(marker)? + marker.len();
    let rest = &body[start..];
    match rest.find('&') {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

/// Errors produced while parsing a portal form submission.
///
/// Every variant maps to a `400 Bad Request` with no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// The request body was empty.
    EmptyBody,
    /// A required field marker was absent from the body.
    MissingField(&'static str),
    /// Decoded bytes were not valid UTF-8.
    InvalidEncoding,
    /// The decoded pair failed credential validation.
    InvalidCredentials(ConfigError),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "empty body"),
            Self::MissingField(name) => write!(f, "missing field: {}", name),
            Self::InvalidEncoding => write!(f, "invalid encoding"),
            Self::InvalidCredentials(e) => write!(f, "invalid credentials: {}", e),
        }
    }
}

impl std::error::Error for FormError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== url_decode ====================

    #[test]
    fn test_decode_plain_is_identity() {
        assert_eq!(url_decode("HomeNet").unwrap(), "HomeNet");
    }

    #[test]
    fn test_decode_is_idempotent_on_plain_input() {
        let once = url_decode("plain-input.123").unwrap();
        let twice = url_decode(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_decode_plus_and_percent() {
        assert_eq!(url_decode("a+b%20c").unwrap(), "a b c");
    }

    #[test]
    fn test_decode_percent_bytes() {
        assert_eq!(url_decode("caf%C3%A9").unwrap(), "café");
        assert_eq!(url_decode("%3D%26").unwrap(), "=&");
    }

    #[test]
    fn test_decode_malformed_escape_verbatim() {
        assert_eq!(url_decode("100%").unwrap(), "100%");
        assert_eq!(url_decode("%zz").unwrap(), "%zz");
        assert_eq!(url_decode("%4").unwrap(), "%4");
    }

    #[test]
    fn test_decode_invalid_utf8_rejected() {
        assert_eq!(url_decode("%FF%FE"), Err(FormError::InvalidEncoding));
    }

    // ==================== parse_credentials_form ====================

    #[test]
    fn test_parse_happy_path() {
        let creds = parse_credentials_form("ssid=Home%20Net&password=secret123").unwrap();
        assert_eq!(creds.ssid(), "Home Net");
        assert_eq!(creds.password(), "secret123");
    }

    #[test]
    fn test_parse_empty_password() {
        let creds = parse_credentials_form("ssid=OpenNet&password=").unwrap();
        assert!(creds.is_open());
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_credentials_form(""), Err(FormError::EmptyBody));
    }

    #[test]
    fn test_parse_missing_password_field() {
        assert_eq!(
            parse_credentials_form("ssid=HomeNet"),
            Err(FormError::MissingField("password"))
        );
    }

    #[test]
    fn test_parse_missing_ssid_field() {
        assert_eq!(
            parse_credentials_form("password=secret123"),
            Err(FormError::MissingField("ssid"))
        );
    }

    #[test]
    fn test_parse_empty_ssid_rejected() {
        assert_eq!(
            parse_credentials_form("ssid=&password=secret123"),
            Err(FormError::InvalidCredentials(ConfigError::SsidEmpty))
        );
    }

    #[test]
    fn test_parse_oversized_ssid_rejected_not_truncated() {
        let body = format!("ssid={}&password=x", "a".repeat(33));
        assert!(matches!(
            parse_credentials_form(&body),
            Err(FormError::InvalidCredentials(ConfigError::SsidTooLong { .. }))
        ));
    }

    #[test]
    fn test_parse_field_order_does_not_matter() {
        let creds = parse_credentials_form("password=secret123&ssid=HomeNet").unwrap();
        assert_eq!(creds.ssid(), "HomeNet");
        assert_eq!(creds.password(), "secret123");
    }
}
