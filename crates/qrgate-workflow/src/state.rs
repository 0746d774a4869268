//! Workflow state representation.
//!
//! One tagged union replaces the original's loose collection of boolean
//! flags: a state either is `Scanning`, or carries the scan session it is
//! reviewing, or carries the session plus a generated PIN. Combinations the
//! workflow can never be in (a PIN without a scan, an identity without its
//! secret key) are unrepresentable.

use qrgate_core::{DeviceIdentity, Pin, ScannedAccessRequest, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// What the backend resolved for a scanned payload.
///
/// The secret key and the decrypted identity arrive from two sequential
/// calls but are only usable together, so they travel together: PIN
/// generation needs the key, the identity's `guid`, and its role.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDevice {
    pub secret_key: SecretKey,
    pub identity: DeviceIdentity,
}

/// Everything belonging to one scan, from payload to (eventually) PIN.
///
/// `resolved` stays `None` when secret-key fetch or decryption failed; the
/// scanned request itself remains visible. `pin` is kept when navigating
/// back from the PIN view so returning does not regenerate it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSession {
    pub request: ScannedAccessRequest,
    pub resolved: Option<ResolvedDevice>,
    pub pin: Option<Pin>,
}

impl ScanSession {
    #[must_use]
    pub fn new(request: ScannedAccessRequest) -> Self {
        Self {
            request,
            resolved: None,
            pin: None,
        }
    }
}

/// The workflow's current state.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// Waiting for a camera scan or an image upload.
    Scanning,

    /// A payload was scanned; the user reviews the device details.
    Reviewing(ScanSession),

    /// A PIN was generated for the reviewed device.
    ///
    /// Invariant: `session.pin` is always `Some` in this state.
    PinDisplayed(ScanSession),
}

impl WorkflowState {
    /// The stage discriminant of this state.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            WorkflowState::Scanning => Stage::Scanning,
            WorkflowState::Reviewing(_) => Stage::Reviewing,
            WorkflowState::PinDisplayed(_) => Stage::PinDisplayed,
        }
    }

    /// The scan session carried by this state, if any.
    #[must_use]
    pub fn scan_session(&self) -> Option<&ScanSession> {
        match self {
            WorkflowState::Scanning => None,
            WorkflowState::Reviewing(session) | WorkflowState::PinDisplayed(session) => {
                Some(session)
            }
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stage())
    }
}

/// Stage discriminant used for transition validation and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scanning,
    Reviewing,
    PinDisplayed,
}

impl Stage {
    /// Check if a transition to the target stage is valid from this stage.
    ///
    /// Reset is the only path back to `Scanning` and is allowed from
    /// everywhere, including `Scanning` itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use qrgate_workflow::Stage;
    ///
    /// assert!(Stage::Scanning.can_transition_to(&Stage::Reviewing));
    /// assert!(Stage::PinDisplayed.can_transition_to(&Stage::Reviewing));
    /// assert!(!Stage::Scanning.can_transition_to(&Stage::PinDisplayed));
    /// ```
    #[must_use]
    pub fn can_transition_to(&self, target: &Stage) -> bool {
        matches!(
            (self, target),
            // Scan success
            (Stage::Scanning, Stage::Reviewing)
            // PIN generated
            | (Stage::Reviewing, Stage::PinDisplayed)
            // Back to the scanned data, PIN retained
            | (Stage::PinDisplayed, Stage::Reviewing)
            // Reset from anywhere
            | (_, Stage::Scanning)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Scanning => "Scanning",
            Stage::Reviewing => "Reviewing",
            Stage::PinDisplayed => "PinDisplayed",
        };
        write!(f, "{name}")
    }
}

/// A single stage transition with timestamp, kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,

    /// When the transition occurred. Not serialized: `Instant` is
    /// process-specific, so deserialized records carry the time of
    /// deserialization instead.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StageTransition {
    #[must_use]
    pub fn new(from: Stage, to: Stage) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition occurred.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}
