use crate::roles::RoleCode;
use std::fmt;
use thiserror::Error;

/// Backend operation tag attached to normalized network errors.
///
/// Each variant corresponds to one backend endpoint. The tag keeps the
/// operation identifiable after transport and status failures have been
/// flattened into a single error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Login,
    FetchSecretKey,
    Decrypt,
    GeneratePin,
}

impl ApiOperation {
    /// The user-visible text shown when this operation fails.
    #[must_use]
    pub fn failure_message(&self) -> &'static str {
        match self {
            ApiOperation::Login => "An error occurred. Please try again.",
            ApiOperation::FetchSecretKey => "Failed to fetch secret key",
            ApiOperation::Decrypt => "Decryption failed",
            ApiOperation::GeneratePin => "Failed to generate PIN",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiOperation::Login => "login",
            ApiOperation::FetchSecretKey => "fetch-secret-key",
            ApiOperation::Decrypt => "decrypt",
            ApiOperation::GeneratePin => "generate-pin",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // QR payload errors
    #[error("Invalid QR code format: {message}")]
    InvalidPayloadFormat { message: String },

    #[error("No QR code found in image")]
    NoCodeFound,

    // Network errors (single attempt, normalized before reaching the workflow)
    #[error("{message}")]
    Network {
        operation: ApiOperation,
        message: String,
    },

    /// Scan-time wrapper: fetch-secret-key or decrypt failed after a
    /// successful parse. The scanned MAC address stays visible; the
    /// underlying cause is kept as the source.
    #[error("Failed to process QR code")]
    ScanFailed {
        #[source]
        source: Box<Error>,
    },

    // Guard errors
    #[error("Machine role is not same as logged-in role")]
    RoleMismatch { device: RoleCode, session: RoleCode },

    #[error("No Role Assigned")]
    NoRoleAssigned,

    #[error("Scanned device has not been resolved")]
    DeviceUnresolved,

    // Workflow errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Validation errors
    #[error("Invalid PIN format: {0}")]
    InvalidPinFormat(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    // Session errors
    #[error("Session error: {0}")]
    Session(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Normalized network error carrying the operation's standard failure text.
    #[must_use]
    pub fn network(operation: ApiOperation) -> Self {
        Error::Network {
            operation,
            message: operation.failure_message().to_string(),
        }
    }

    /// Normalized network error with a custom human-readable message
    /// (login surfaces the backend's own message when one is present).
    #[must_use]
    pub fn network_with(operation: ApiOperation, message: impl Into<String>) -> Self {
        Error::Network {
            operation,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_uses_operation_failure_text() {
        let err = Error::network(ApiOperation::FetchSecretKey);
        assert_eq!(err.to_string(), "Failed to fetch secret key");

        let err = Error::network(ApiOperation::Decrypt);
        assert_eq!(err.to_string(), "Decryption failed");

        let err = Error::network(ApiOperation::GeneratePin);
        assert_eq!(err.to_string(), "Failed to generate PIN");
    }

    #[test]
    fn test_network_error_custom_message() {
        let err = Error::network_with(ApiOperation::Login, "Invalid credentials");
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_scan_failed_displays_generic_text_and_keeps_cause() {
        let cause = Error::network(ApiOperation::Decrypt);
        let err = Error::ScanFailed {
            source: Box::new(cause),
        };
        assert_eq!(err.to_string(), "Failed to process QR code");

        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "Decryption failed");
    }

    #[test]
    fn test_role_mismatch_message_is_fixed() {
        let err = Error::RoleMismatch {
            device: RoleCode::Maintainer,
            session: RoleCode::Admin,
        };
        assert_eq!(err.to_string(), "Machine role is not same as logged-in role");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(ApiOperation::Login.to_string(), "login");
        assert_eq!(ApiOperation::FetchSecretKey.to_string(), "fetch-secret-key");
        assert_eq!(ApiOperation::Decrypt.to_string(), "decrypt");
        assert_eq!(ApiOperation::GeneratePin.to_string(), "generate-pin");
    }
}
