//! Backend client for the QR access workflow.
//!
//! Three device operations (fetch secret key, decrypt payload, generate
//! PIN) plus login, all JSON-over-HTTP POSTs against a deployment-supplied
//! base URL. The workflow consumes the [`DeviceAccessApi`] trait; the real
//! [`ApiClient`] and the scriptable [`MockApi`] both implement it.

pub mod api;
pub mod client;
pub mod mock;

pub use api::{DeviceAccessApi, LoginResponse, PinRequest};
pub use client::{ApiClient, ApiClientConfig};
pub use mock::{MockApi, MockApiHandle, RecordedCall};
