//! The logged-in user's identity as seen by the workflow.

use crate::store::SessionStore;
use chrono::{DateTime, Utc};
use qrgate_core::{Error, Result, RoleCode};

/// Read-only session identity passed to the workflow controller at
/// construction.
///
/// The role is held in canonical form; the display label it arrived as is
/// kept for rendering. The controller never reaches into ambient storage:
/// whatever it needs from the session travels in here.
#[derive(Debug, Clone)]
pub struct SessionContext {
    role: RoleCode,
    role_display: String,
    user: serde_json::Map<String, serde_json::Value>,
    established_at: DateTime<Utc>,
}

impl SessionContext {
    /// Build a context directly from a role. Useful for tests and for
    /// embedders that manage login state themselves.
    #[must_use]
    pub fn new(role: RoleCode) -> Self {
        Self {
            role,
            role_display: role.to_display().to_string(),
            user: serde_json::Map::new(),
            established_at: Utc::now(),
        }
    }

    /// Derive the context from a populated session store.
    ///
    /// # Errors
    /// Returns `Error::Session` when no login has been recorded or the
    /// stored values are malformed.
    pub fn from_store(store: &SessionStore) -> Result<Self> {
        let role_display = store
            .role_display()?
            .ok_or_else(|| Error::Session("no logged-in role in session store".to_string()))?;
        let user = store.user_record()?.unwrap_or_default();

        Ok(Self {
            role: RoleCode::from_display(&role_display),
            role_display,
            user,
            established_at: Utc::now(),
        })
    }

    /// The session role in canonical form.
    #[must_use]
    pub fn role(&self) -> RoleCode {
        self.role
    }

    /// The display label the role arrived as.
    #[must_use]
    pub fn role_display(&self) -> &str {
        &self.role_display
    }

    /// The flat user record captured at login.
    #[must_use]
    pub fn user(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.user
    }

    /// When this context was established.
    #[must_use]
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }
}
