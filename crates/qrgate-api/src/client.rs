//! HTTP client for the device access backend.
//!
//! A thin transport layer over `reqwest`:
//!
//! - **No automatic retry**: the user re-triggers the action; the caller
//!   decides whether to ask again.
//! - **No connection pooling policy**: one client per application session,
//!   reusing `reqwest`'s defaults.
//! - **Normalized errors**: a transport failure, timeout, non-2xx status,
//!   or undecodable body all surface as the same `Error::Network` shape,
//!   tagged with the operation and carrying its user-visible text. The raw
//!   cause goes to the log, not the caller.
//!
//! # Example
//!
//! ```no_run
//! use qrgate_api::{ApiClient, ApiClientConfig, DeviceAccessApi};
//!
//! # async fn example() -> qrgate_core::Result<()> {
//! let client = ApiClient::new(ApiClientConfig {
//!     base_url: "https://access.example.com".to_string(),
//!     ..ApiClientConfig::default()
//! })?;
//!
//! let key = client.fetch_secret_key("AA:BB:CC:DD:EE:FF").await?;
//! let identity = client.decrypt("AA:BB:CC:DD:EE:FF", "0a1b2c").await?;
//! println!("device {} has role {}", identity.guid, identity.role);
//! # Ok(())
//! # }
//! ```

use crate::api::{DeviceAccessApi, LoginResponse, PinRequest};
use qrgate_core::constants::{
    DECRYPT_PATH, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT_MS, ENV_BASE_URL, ENV_HTTP_TIMEOUT_MS,
    GENERATE_PIN_PATH, LOGIN_PATH, SECRET_KEY_PATH,
};
use qrgate_core::{ApiOperation, DeviceIdentity, Error, Pin, Result, SecretKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// User-visible text for a login attempt that never reached the backend.
const LOGIN_TRANSPORT_ERROR: &str = "Network error. Please check your connection.";

/// Configuration for the backend client.
///
/// # Example
///
/// ```
/// use qrgate_api::ApiClientConfig;
/// use std::time::Duration;
///
/// let config = ApiClientConfig {
///     base_url: "https://access.example.com".to_string(),
///     timeout: Duration::from_millis(5000),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
        }
    }
}

impl ApiClientConfig {
    /// Build the configuration from the environment.
    ///
    /// `QRGATE_BASE_URL` is required; `QRGATE_HTTP_TIMEOUT_MS` optionally
    /// overrides the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingConfig` when the base URL variable is unset
    /// and `Error::Config` when the timeout override is not a number.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(ENV_BASE_URL).map_err(|_| Error::MissingConfig(ENV_BASE_URL.into()))?;

        let timeout = match std::env::var(ENV_HTTP_TIMEOUT_MS) {
            Ok(raw) => {
                let millis: u64 = raw.parse().map_err(|_| {
                    Error::Config(format!("{ENV_HTTP_TIMEOUT_MS} must be a number, got {raw:?}"))
                })?;
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
        };

        Ok(Self { base_url, timeout })
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretKeyRequest<'a> {
    mac_address: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecryptRequest<'a> {
    mac_address: &'a str,
    encrypted_data: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretKeyResponse {
    secret_key: String,
}

#[derive(Deserialize)]
struct DecryptResponse {
    decrypted: DeviceIdentity,
}

#[derive(Deserialize)]
struct GeneratePinResponse {
    generated_pin: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP implementation of [`DeviceAccessApi`] plus the login operation.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        debug!("creating API client for {}", config.base_url);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from environment configuration.
    ///
    /// # Errors
    ///
    /// See [`ApiClientConfig::from_env`] and [`ApiClient::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(ApiClientConfig::from_env()?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticate a user.
    ///
    /// On success the response carries the display-form role and the flat
    /// user record for the session store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` tagged `login`. A non-2xx response surfaces
    /// the backend's own `message` when present, otherwise a generic text;
    /// a transport-level failure surfaces a connection-check text.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        debug!("POST {LOGIN_PATH} for {email}");

        let response = self
            .http
            .post(format!("{}{LOGIN_PATH}", self.base_url))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| {
                warn!("login transport failure: {e}");
                Error::network_with(ApiOperation::Login, LOGIN_TRANSPORT_ERROR)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| ApiOperation::Login.failure_message().to_string());
            warn!("login rejected with status {status}: {message}");
            return Err(Error::network_with(ApiOperation::Login, message));
        }

        response.json::<LoginResponse>().await.map_err(|e| {
            warn!("login response body undecodable: {e}");
            Error::network(ApiOperation::Login)
        })
    }

    /// POST a device operation and return the successful response for
    /// decoding. Any failure collapses to the operation's normalized error.
    async fn post_device_op<B: Serialize>(
        &self,
        operation: ApiOperation,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response> {
        debug!("POST {path}");

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("{operation} transport failure: {e}");
                Error::network(operation)
            })?;

        if !response.status().is_success() {
            warn!("{operation} rejected with status {}", response.status());
            return Err(Error::network(operation));
        }

        Ok(response)
    }
}

impl DeviceAccessApi for ApiClient {
    async fn fetch_secret_key(&self, mac_address: &str) -> Result<SecretKey> {
        let operation = ApiOperation::FetchSecretKey;
        let response = self
            .post_device_op(operation, SECRET_KEY_PATH, &SecretKeyRequest { mac_address })
            .await?;

        let body: SecretKeyResponse = response.json().await.map_err(|e| {
            warn!("{operation} response body undecodable: {e}");
            Error::network(operation)
        })?;

        SecretKey::new(&body.secret_key).map_err(|e| {
            warn!("{operation} returned an unusable key: {e}");
            Error::network(operation)
        })
    }

    async fn decrypt(&self, mac_address: &str, encrypted_data: &str) -> Result<DeviceIdentity> {
        let operation = ApiOperation::Decrypt;
        let response = self
            .post_device_op(
                operation,
                DECRYPT_PATH,
                &DecryptRequest {
                    mac_address,
                    encrypted_data,
                },
            )
            .await?;

        let body: DecryptResponse = response.json().await.map_err(|e| {
            warn!("{operation} response body undecodable: {e}");
            Error::network(operation)
        })?;

        Ok(body.decrypted)
    }

    async fn generate_pin(&self, request: &PinRequest) -> Result<Pin> {
        let operation = ApiOperation::GeneratePin;
        let response = self
            .post_device_op(operation, GENERATE_PIN_PATH, request)
            .await?;

        let body: GeneratePinResponse = response.json().await.map_err(|e| {
            warn!("{operation} response body undecodable: {e}");
            Error::network(operation)
        })?;

        // The backend emits the PIN as a JSON string or number.
        let raw = match &body.generated_pin {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                warn!("{operation} returned a non-scalar PIN: {other}");
                return Err(Error::network(operation));
            }
        };

        Pin::new(&raw).map_err(|e| {
            warn!("{operation} returned an unusable PIN: {e}");
            Error::network(operation)
        })
    }
}
