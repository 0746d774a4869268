use crate::{Result, error::Error, roles::RoleCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// The two fields carried by a device QR code.
///
/// Produced by the payload parser from raw scanned/uploaded text and
/// immutable from then on. Missing fields are coerced to empty strings
/// rather than rejected: an empty `mac_address` or `encrypted_data` is a
/// usable-but-degenerate request whose downstream backend calls fail
/// naturally. Only total structural failure of the payload is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedAccessRequest {
    #[serde(default)]
    pub mac_address: String,

    #[serde(default)]
    pub encrypted_data: String,
}

impl ScannedAccessRequest {
    #[must_use]
    pub fn new(mac_address: impl Into<String>, encrypted_data: impl Into<String>) -> Self {
        Self {
            mac_address: mac_address.into(),
            encrypted_data: encrypted_data.into(),
        }
    }
}

/// Decrypted device record returned by the backend.
///
/// Owned by the workflow for the duration of one scan session and discarded
/// on reset. Fields the backend omits default to empty strings; an absent or
/// unrecognized role becomes [`RoleCode::Unassigned`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub guid: String,
    pub board_version: String,
    pub embedded_version: String,
    pub serial_number: String,
    pub hardware_version: String,
    pub software_version: String,
    pub role: RoleCode,
}

/// Per-device secret key fetched from the backend.
///
/// Cached write-once per scan and consumed by PIN generation. `Debug` is
/// redacted and comparison is constant-time, matching how credential
/// material is treated elsewhere in the system.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct SecretKey(String);

impl SecretKey {
    /// Create a secret key.
    ///
    /// # Errors
    /// Returns `Error::InvalidSecretKey` if the key is empty after trimming.
    pub fn new(key: &str) -> Result<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidSecretKey("key must not be empty".to_string()));
        }
        Ok(SecretKey(key.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(***)")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for SecretKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::str::FromStr for SecretKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SecretKey::new(s)
    }
}

/// One-time numeric unlock code returned by the backend.
///
/// Ephemeral: held only in the workflow's current state, never persisted.
/// The backend governs expiry and uniqueness.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Pin(String);

impl Pin {
    /// Create a PIN with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPinFormat` if the value is empty or contains
    /// anything other than ASCII digits.
    pub fn new(pin: &str) -> Result<Self> {
        let pin = pin.trim();
        if pin.is_empty() || !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidPinFormat(format!(
                "PIN must be ASCII digits, got {pin:?}"
            )));
        }
        Ok(Pin(pin.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Individual digits, in order, for digit-by-digit rendering.
    pub fn digits(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars()
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Constant-time comparison: a PIN is credential material.
impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for Pin {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::str::FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pin::new(s)
    }
}
