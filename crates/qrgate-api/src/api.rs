//! Device access API contract.
//!
//! The workflow controller is generic over this trait, enabling
//! substitution between the HTTP-backed [`crate::ApiClient`] and the
//! scriptable [`crate::MockApi`].
//!
//! All methods use native `async fn` (Edition 2024 RPITIT), so the trait is
//! not object-safe; consume it through generic type parameters:
//!
//! ```no_run
//! use qrgate_api::DeviceAccessApi;
//! use qrgate_core::{Result, SecretKey};
//!
//! async fn prefetch<A: DeviceAccessApi>(api: &A, mac: &str) -> Result<SecretKey> {
//!     api.fetch_secret_key(mac).await
//! }
//! ```

#![allow(async_fn_in_trait)]

use qrgate_core::{DeviceIdentity, Pin, Result, RoleCode, SecretKey};
use serde::{Deserialize, Serialize};

/// Wire body of a PIN generation request.
///
/// The `role` is the session role in raw form; the `secret_key` is the one
/// fetched earlier in the same scan, reused rather than re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRequest {
    pub mac_address: String,
    pub guid: String,
    pub role: RoleCode,
    pub secret_key: SecretKey,
}

/// Successful login body: the display-form role plus the flat user record.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub roles: String,

    #[serde(flatten)]
    pub user: serde_json::Map<String, serde_json::Value>,
}

impl LoginResponse {
    /// The session role in canonical form. An unrecognized display label
    /// yields [`RoleCode::Unassigned`].
    #[must_use]
    pub fn role_code(&self) -> RoleCode {
        RoleCode::from_display(&self.roles)
    }
}

/// The three backend operations the scan workflow depends on.
///
/// Each call is a single attempt; no automatic retry. Implementations
/// normalize every transport failure or non-success status into
/// `Error::Network` with the operation's user-visible text before
/// returning.
pub trait DeviceAccessApi: Send + Sync {
    /// Fetch the per-device secret key for a MAC address.
    ///
    /// The caller caches the key for later PIN generation within the same
    /// scan session.
    async fn fetch_secret_key(&self, mac_address: &str) -> Result<SecretKey>;

    /// Decrypt a scanned payload into the device's identity record.
    async fn decrypt(&self, mac_address: &str, encrypted_data: &str) -> Result<DeviceIdentity>;

    /// Request a one-time PIN for a resolved device.
    async fn generate_pin(&self, request: &PinRequest) -> Result<Pin>;
}
