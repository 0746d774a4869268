//! Transient session store.
//!
//! A string-keyed map of JSON-serialized values scoped to one app session:
//! the logged-in user's display-form role under `userRoles` and the flat
//! user record under `userData`. Written by the login flow, read when a
//! [`crate::SessionContext`] is built, and cleared on logout. No other
//! process mutates it.

use qrgate_api::LoginResponse;
use qrgate_core::constants::{SESSION_KEY_USER_DATA, SESSION_KEY_USER_ROLES};
use qrgate_core::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;

/// In-memory key-value store with JSON-serialized values.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    values: HashMap<String, serde_json::Value>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize and store a value under a key, replacing any prior value.
    ///
    /// # Errors
    /// Returns `Error::Session` if the value cannot be serialized.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::Session(format!("failed to serialize {key}: {e}")))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Read and deserialize the value stored under a key.
    ///
    /// # Errors
    /// Returns `Error::Session` if a stored value does not deserialize into
    /// the requested type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Session(format!("failed to deserialize {key}: {e}"))),
        }
    }

    /// Remove one key. Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Clear everything. This is the logout path.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record a successful login: display-form role plus the flat user
    /// record.
    ///
    /// # Errors
    /// Returns `Error::Session` on serialization failure.
    pub fn store_login(&mut self, login: &LoginResponse) -> Result<()> {
        self.set(SESSION_KEY_USER_ROLES, &login.roles)?;
        self.set(SESSION_KEY_USER_DATA, &login.user)
    }

    /// The logged-in user's display-form role, if a login was recorded.
    ///
    /// # Errors
    /// Returns `Error::Session` if the stored value is not a string.
    pub fn role_display(&self) -> Result<Option<String>> {
        self.get(SESSION_KEY_USER_ROLES)
    }

    /// The flat user record, if a login was recorded.
    ///
    /// # Errors
    /// Returns `Error::Session` if the stored value is not a record.
    pub fn user_record(&self) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
        self.get(SESSION_KEY_USER_DATA)
    }
}
