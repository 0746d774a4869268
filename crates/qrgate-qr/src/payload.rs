//! QR payload parser.
//!
//! The text embedded in a device QR symbol is a JSON record:
//!
//! ```text
//! {"macAddress":"AA:BB:CC:DD:EE:FF","encryptedData":"0a1b2c..."}
//! ```
//!
//! # Leniency
//!
//! Missing fields are coerced to empty strings, not rejected: the caller
//! receives a usable-but-degenerate request whose backend calls fail
//! naturally. Unknown extra fields are ignored. Only input that is not a
//! decodable JSON record at all is an error. This asymmetry is deliberate
//! and part of the contract with the scanning surface.
//!
//! # Examples
//!
//! ```
//! use qrgate_qr::payload;
//!
//! let request = payload::parse(r#"{"macAddress":"AA:BB","encryptedData":"xyz"}"#).unwrap();
//! assert_eq!(request.mac_address, "AA:BB");
//! assert_eq!(request.encrypted_data, "xyz");
//!
//! // Missing fields are coerced, not rejected
//! let degenerate = payload::parse("{}").unwrap();
//! assert_eq!(degenerate.mac_address, "");
//!
//! // Non-record input is a format error
//! assert!(payload::parse("not-json").is_err());
//! ```

use qrgate_core::{Error, Result, ScannedAccessRequest};

/// Parse raw QR text into a [`ScannedAccessRequest`].
///
/// Leading and trailing whitespace is trimmed before decoding. No side
/// effects.
///
/// # Errors
///
/// Returns `Error::InvalidPayloadFormat` when the text is not a decodable
/// JSON record.
pub fn parse(raw: &str) -> Result<ScannedAccessRequest> {
    serde_json::from_str(raw.trim()).map_err(|e| Error::InvalidPayloadFormat {
        message: e.to_string(),
    })
}
