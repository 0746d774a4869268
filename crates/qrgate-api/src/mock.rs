//! Mock backend API for testing and development.

use crate::api::{DeviceAccessApi, PinRequest};
use qrgate_core::{ApiOperation, DeviceIdentity, Error, Pin, Result, SecretKey};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded backend call, in invocation order.
///
/// The record is what makes the guard and ordering properties testable:
/// a test can assert that `/generate-pin` was never reached, or that the
/// secret key was fetched before decryption.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FetchSecretKey {
        mac_address: String,
    },
    Decrypt {
        mac_address: String,
        encrypted_data: String,
    },
    GeneratePin {
        request: PinRequest,
    },
}

#[derive(Default)]
struct MockState {
    secret_keys: VecDeque<Result<SecretKey>>,
    decrypts: VecDeque<Result<DeviceIdentity>>,
    pins: VecDeque<Result<Pin>>,
    calls: Vec<RecordedCall>,
}

/// Scriptable [`DeviceAccessApi`] implementation.
///
/// Constructed together with a [`MockApiHandle`] that queues per-operation
/// outcomes and inspects the calls made, in the same spirit as the
/// hardware mocks elsewhere in the system:
///
/// ```
/// use qrgate_api::{DeviceAccessApi, MockApi};
/// use qrgate_core::SecretKey;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (api, handle) = MockApi::new();
/// handle.queue_secret_key(SecretKey::new("K1"));
///
/// let key = api.fetch_secret_key("AA:BB").await.unwrap();
/// assert_eq!(key.as_str(), "K1");
/// assert_eq!(handle.calls().len(), 1);
/// # }
/// ```
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

/// Handle for scripting a [`MockApi`] and inspecting its recorded calls.
#[derive(Clone)]
pub struct MockApiHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    /// Create a mock API and its scripting handle.
    #[must_use]
    pub fn new() -> (Self, MockApiHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockApiHandle { state },
        )
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockApiHandle {
    /// Queue the outcome of the next `fetch_secret_key` call.
    pub fn queue_secret_key(&self, outcome: Result<SecretKey>) {
        self.lock().secret_keys.push_back(outcome);
    }

    /// Queue the outcome of the next `decrypt` call.
    pub fn queue_decrypt(&self, outcome: Result<DeviceIdentity>) {
        self.lock().decrypts.push_back(outcome);
    }

    /// Queue the outcome of the next `generate_pin` call.
    pub fn queue_pin(&self, outcome: Result<Pin>) {
        self.lock().pins.push_back(outcome);
    }

    /// Another API view over the same scripted state.
    ///
    /// Lets a test drive the split begin/resolve/complete flow with the
    /// same queues and call record as the workflow's own instance.
    #[must_use]
    pub fn api(&self) -> MockApi {
        MockApi {
            state: Arc::clone(&self.state),
        }
    }

    /// All calls made so far, in invocation order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn exhausted(operation: ApiOperation) -> Error {
    Error::network_with(operation, format!("no mock outcome queued for {operation}"))
}

impl DeviceAccessApi for MockApi {
    async fn fetch_secret_key(&self, mac_address: &str) -> Result<SecretKey> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::FetchSecretKey {
            mac_address: mac_address.to_string(),
        });
        state
            .secret_keys
            .pop_front()
            .unwrap_or_else(|| Err(exhausted(ApiOperation::FetchSecretKey)))
    }

    async fn decrypt(&self, mac_address: &str, encrypted_data: &str) -> Result<DeviceIdentity> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Decrypt {
            mac_address: mac_address.to_string(),
            encrypted_data: encrypted_data.to_string(),
        });
        state
            .decrypts
            .pop_front()
            .unwrap_or_else(|| Err(exhausted(ApiOperation::Decrypt)))
    }

    async fn generate_pin(&self, request: &PinRequest) -> Result<Pin> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::GeneratePin {
            request: request.clone(),
        });
        state
            .pins
            .pop_front()
            .unwrap_or_else(|| Err(exhausted(ApiOperation::GeneratePin)))
    }
}
