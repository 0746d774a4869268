//! Shared constants for the QR access workflow.
//!
//! Centralizes the backend endpoint paths, session-store keys, and client
//! configuration defaults so the wire contract lives in one place.
//!
//! # Backend endpoints
//!
//! All operations are JSON-over-HTTP POSTs against a deployment-supplied
//! base URL:
//!
//! | Operation | Path |
//! |-----------|------|
//! | Login | `/login` |
//! | Fetch secret key | `/get-secret-key` |
//! | Decrypt payload | `/decrypt` |
//! | Generate PIN | `/generate-pin` |

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/login";

/// Secret key fetch endpoint path.
pub const SECRET_KEY_PATH: &str = "/get-secret-key";

/// Payload decryption endpoint path.
pub const DECRYPT_PATH: &str = "/decrypt";

/// PIN generation endpoint path.
pub const GENERATE_PIN_PATH: &str = "/generate-pin";

/// Session-store key holding the logged-in user's display-form role.
pub const SESSION_KEY_USER_ROLES: &str = "userRoles";

/// Session-store key holding the flat logged-in user record.
pub const SESSION_KEY_USER_DATA: &str = "userData";

/// Environment variable supplying the backend base URL.
pub const ENV_BASE_URL: &str = "QRGATE_BASE_URL";

/// Environment variable overriding the HTTP timeout, in milliseconds.
pub const ENV_HTTP_TIMEOUT_MS: &str = "QRGATE_HTTP_TIMEOUT_MS";

/// Base URL used when no deployment configuration is present.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Timeout applied to every backend call (milliseconds).
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 3000;
