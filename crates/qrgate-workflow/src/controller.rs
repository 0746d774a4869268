//! Access workflow controller.
//!
//! Owns the scan-to-PIN flow for one user session: parsing scanned text,
//! resolving the device through the backend, enforcing the role-match
//! guard, and driving the state transitions of [`WorkflowState`]. Every
//! state change is validated against the [`Stage`] transition table before
//! it happens; an edge the table forbids never touches state and lands in
//! the relevant message slot as an invalid-transition error instead.
//!
//! # Guard sequence
//!
//! A PIN request passes through a strict sequence of checks, failing fast
//! at the first refusal and reaching the network only after all pass:
//!
//! 1. **Stage**: the transition table must allow reaching `PinDisplayed`
//!    from the current stage → otherwise an invalid-transition error
//! 2. **Resolution**: the device identity must have been decrypted
//! 3. **Role presence**: a device role outside the closed set blocks with
//!    `NoRoleAssigned`
//! 4. **Role match**: device role must equal the session role (canonical
//!    comparison) → otherwise `RoleMismatch`
//! 5. **Request**: `generate_pin` with the cached secret key, the decrypted
//!    `guid`, and the session role in raw form
//!
//! # Error surfacing
//!
//! Errors never propagate out of the controller. They land in one of two
//! slots (scan-time and PIN-time) mirroring the two places a UI shows
//! them. A successful transition clears the slot for its context;
//! [`AccessWorkflow::reset`] clears both.
//!
//! # Cancellation
//!
//! Every scan carries a [`ScanGeneration`]. Network exchanges are split
//! into a begin step that stamps a ticket ([`AccessWorkflow::begin_scan`],
//! [`AccessWorkflow::accept_scan`], [`AccessWorkflow::begin_pin_request`]),
//! an awaitable resolve step, and a `complete_*` step that applies the
//! outcome only if the ticket's generation is still current. `reset()` and
//! each new scan bump the generation, so a response that arrives for a
//! superseded scan is discarded instead of written onto newer state. The high-level
//! [`AccessWorkflow::scan`] and [`AccessWorkflow::request_pin`] compose
//! the three steps; drivers that dispatch network work themselves use the
//! split form directly.
//!
//! # Thread safety
//!
//! The controller is not thread-safe by design: one workflow instance per
//! user session, one request in flight at a time. In async contexts,
//! protect shared access with `tokio::sync::Mutex` or similar.
//!
//! # Example
//!
//! ```no_run
//! use qrgate_api::{ApiClient, ApiClientConfig};
//! use qrgate_core::RoleCode;
//! use qrgate_session::SessionContext;
//! use qrgate_workflow::{AccessWorkflow, Stage};
//!
//! # async fn example() -> qrgate_core::Result<()> {
//! let api = ApiClient::new(ApiClientConfig::default())?;
//! let session = SessionContext::new(RoleCode::Admin);
//! let mut workflow = AccessWorkflow::new(api, session);
//!
//! workflow
//!     .scan(r#"{"macAddress":"AA:BB","encryptedData":"0a1b2c"}"#)
//!     .await;
//! if workflow.can_request_pin() {
//!     workflow.request_pin().await;
//! }
//! assert_eq!(workflow.stage(), Stage::PinDisplayed);
//! # Ok(())
//! # }
//! ```

use crate::state::{ResolvedDevice, ScanSession, Stage, StageTransition, WorkflowState};
use qrgate_api::{DeviceAccessApi, PinRequest};
use qrgate_core::{DeviceIdentity, Error, Pin, Result, ScannedAccessRequest};
use qrgate_qr::{ImageDecoder, decode_scan, payload};
use qrgate_session::SessionContext;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Maximum number of stage transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 64;

/// Monotonic tag identifying which scan an in-flight exchange belongs to.
///
/// Bumped by every accepted scan and every reset; a completion whose
/// ticket carries an older generation is stale and gets dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScanGeneration(u64);

impl ScanGeneration {
    fn next(self) -> Self {
        ScanGeneration(self.0.wrapping_add(1))
    }
}

/// Ticket for an accepted scan, consumed by [`AccessWorkflow::complete_scan`].
#[derive(Debug, Clone)]
#[must_use = "complete the scan with its resolution outcome"]
pub struct ScanTicket {
    generation: ScanGeneration,
    request: ScannedAccessRequest,
}

impl ScanTicket {
    #[must_use]
    pub fn generation(&self) -> ScanGeneration {
        self.generation
    }

    #[must_use]
    pub fn request(&self) -> &ScannedAccessRequest {
        &self.request
    }
}

/// Ticket for a guard-approved PIN request, consumed by
/// [`AccessWorkflow::complete_pin_request`].
#[derive(Debug, Clone)]
#[must_use = "complete the PIN request with its outcome"]
pub struct PinTicket {
    generation: ScanGeneration,
    request: PinRequest,
}

impl PinTicket {
    #[must_use]
    pub fn generation(&self) -> ScanGeneration {
        self.generation
    }

    #[must_use]
    pub fn request(&self) -> &PinRequest {
        &self.request
    }
}

/// Whether PIN generation is currently offered, and if not, why.
///
/// Lets a UI render the distinct affordances (disabled button, "No Role
/// Assigned" label, mismatch notice) without attempting a doomed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAvailability {
    /// The guard would pass; `request_pin` may reach the network.
    Ready,

    /// Not in the reviewing stage.
    NotReviewing,

    /// The scanned payload never resolved into a device identity.
    DeviceUnresolved,

    /// The device role is outside the closed set.
    NoRoleAssigned,

    /// Device role and session role differ.
    RoleMismatch,
}

/// Resolve a scanned payload against the backend.
///
/// The secret key is fetched first and reused for the later PIN request;
/// decryption follows because its result supplies the `guid` and role the
/// PIN request needs. One attempt each, no retry.
///
/// # Errors
///
/// Propagates the first normalized network error; the caller folds it into
/// the scan-time message slot.
pub async fn resolve_access<A: DeviceAccessApi>(
    api: &A,
    request: &ScannedAccessRequest,
) -> Result<ResolvedDevice> {
    let secret_key = api.fetch_secret_key(&request.mac_address).await?;
    let identity = api
        .decrypt(&request.mac_address, &request.encrypted_data)
        .await?;
    Ok(ResolvedDevice {
        secret_key,
        identity,
    })
}

/// State machine driving the QR access workflow for one logged-in user.
pub struct AccessWorkflow<A> {
    api: A,
    session: SessionContext,
    state: WorkflowState,
    generation: ScanGeneration,
    scan_error: Option<Error>,
    pin_error: Option<Error>,
    history: VecDeque<StageTransition>,
}

impl<A: DeviceAccessApi> AccessWorkflow<A> {
    /// Create a workflow in the `Scanning` state for the given session.
    pub fn new(api: A, session: SessionContext) -> Self {
        debug!(role = %session.role(), "creating access workflow");
        Self {
            api,
            session,
            state: WorkflowState::Scanning,
            generation: ScanGeneration::default(),
            scan_error: None,
            pin_error: None,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Current stage discriminant.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    /// The session identity this workflow was constructed with.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Generation tag of the current scan.
    #[must_use]
    pub fn generation(&self) -> ScanGeneration {
        self.generation
    }

    /// The scan-time error slot.
    #[must_use]
    pub fn scan_error(&self) -> Option<&Error> {
        self.scan_error.as_ref()
    }

    /// The PIN-time error slot.
    #[must_use]
    pub fn pin_error(&self) -> Option<&Error> {
        self.pin_error.as_ref()
    }

    /// User-visible text of the scan-time error, if any.
    #[must_use]
    pub fn scan_message(&self) -> Option<String> {
        self.scan_error.as_ref().map(Error::to_string)
    }

    /// User-visible text of the PIN-time error, if any.
    #[must_use]
    pub fn pin_message(&self) -> Option<String> {
        self.pin_error.as_ref().map(Error::to_string)
    }

    /// The request of the scan under review or display, if any.
    #[must_use]
    pub fn scanned_request(&self) -> Option<&ScannedAccessRequest> {
        self.state.scan_session().map(|s| &s.request)
    }

    /// The decrypted device identity, once resolved.
    #[must_use]
    pub fn device_identity(&self) -> Option<&DeviceIdentity> {
        self.state
            .scan_session()
            .and_then(|s| s.resolved.as_ref())
            .map(|r| &r.identity)
    }

    /// The generated PIN, retained until reset.
    #[must_use]
    pub fn pin(&self) -> Option<&Pin> {
        self.state.scan_session().and_then(|s| s.pin.as_ref())
    }

    /// Recent stage transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<StageTransition> {
        &self.history
    }

    /// Whether PIN generation is currently offered, and if not, why.
    #[must_use]
    pub fn pin_availability(&self) -> PinAvailability {
        match &self.state {
            WorkflowState::Reviewing(session) => match &session.resolved {
                None => PinAvailability::DeviceUnresolved,
                Some(resolved) if !resolved.identity.role.is_assigned() => {
                    PinAvailability::NoRoleAssigned
                }
                Some(resolved) if resolved.identity.role != self.session.role() => {
                    PinAvailability::RoleMismatch
                }
                Some(_) => PinAvailability::Ready,
            },
            _ => PinAvailability::NotReviewing,
        }
    }

    /// `true` when the guard would let a PIN request through.
    #[must_use]
    pub fn can_request_pin(&self) -> bool {
        self.pin_availability() == PinAvailability::Ready
    }

    /// Full scan: parse, resolve against the backend, apply.
    ///
    /// Parse failures leave the workflow in `Scanning` with the scan-time
    /// slot set. Resolution failures still enter `Reviewing` with a generic
    /// processing error; the scanned MAC address stays visible.
    pub async fn scan(&mut self, raw: &str) -> &WorkflowState {
        if let Some(ticket) = self.begin_scan(raw) {
            let outcome = resolve_access(&self.api, ticket.request()).await;
            self.complete_scan(ticket, outcome);
        }
        &self.state
    }

    /// Full scan from an uploaded image.
    ///
    /// The image is decoded and parsed by [`decode_scan`]: a missing QR
    /// symbol lands in the scan-time slot as `NoCodeFound`, malformed
    /// symbol text as `InvalidPayloadFormat`, and a decoded payload
    /// continues exactly like [`AccessWorkflow::scan`].
    pub async fn scan_image<D: ImageDecoder>(
        &mut self,
        decoder: &D,
        image: &[u8],
    ) -> &WorkflowState {
        match decode_scan(decoder, image) {
            Ok(request) => {
                if let Some(ticket) = self.accept_scan(request) {
                    let outcome = resolve_access(&self.api, ticket.request()).await;
                    self.complete_scan(ticket, outcome);
                }
            }
            Err(e) => {
                warn!(error = %e, "rejected uploaded image");
                self.scan_error = Some(e);
            }
        }
        &self.state
    }

    /// Full PIN request: guard, generate, apply.
    pub async fn request_pin(&mut self) -> &WorkflowState {
        if let Some(ticket) = self.begin_pin_request() {
            let outcome = self.api.generate_pin(ticket.request()).await;
            self.complete_pin_request(ticket, outcome);
        }
        &self.state
    }

    /// Parse a scanned payload and enter `Reviewing`.
    ///
    /// Returns a generation-stamped ticket for the resolution exchange, or
    /// `None` with the scan-time slot set when the payload is rejected or
    /// the transition table forbids entering review.
    pub fn begin_scan(&mut self, raw: &str) -> Option<ScanTicket> {
        match payload::parse(raw) {
            Ok(request) => self.accept_scan(request),
            Err(e) => {
                warn!(error = %e, "rejected QR payload");
                self.scan_error = Some(e);
                None
            }
        }
    }

    /// Accept an already-parsed payload and enter `Reviewing`.
    ///
    /// The begin step behind both scan forms: [`AccessWorkflow::begin_scan`]
    /// parses raw text first, [`AccessWorkflow::scan_image`] decodes an
    /// uploaded image through [`decode_scan`].
    pub fn accept_scan(&mut self, request: ScannedAccessRequest) -> Option<ScanTicket> {
        self.scan_error = None;

        match self.enter(WorkflowState::Reviewing(ScanSession::new(request.clone()))) {
            Ok(()) => {
                info!(mac = %request.mac_address, "payload scanned");
                self.generation = self.generation.next();
                Some(ScanTicket {
                    generation: self.generation,
                    request,
                })
            }
            Err(e) => {
                self.scan_error = Some(e);
                None
            }
        }
    }

    /// Apply the backend resolution of a scan.
    ///
    /// A ticket from a superseded generation is discarded without touching
    /// current state.
    pub fn complete_scan(&mut self, ticket: ScanTicket, outcome: Result<ResolvedDevice>) {
        if ticket.generation != self.generation {
            debug!("discarding resolution for a superseded scan");
            return;
        }

        let WorkflowState::Reviewing(session) = &mut self.state else {
            return;
        };

        match outcome {
            Ok(resolved) => {
                info!(guid = %resolved.identity.guid, role = %resolved.identity.role, "device resolved");
                session.resolved = Some(resolved);
                self.scan_error = None;
            }
            Err(e) => {
                warn!(error = %e, "failed to process scanned payload");
                session.resolved = None;
                self.scan_error = Some(Error::ScanFailed {
                    source: Box::new(e),
                });
            }
        }
    }

    /// Run the PIN guard sequence and stamp a ticket when it passes.
    ///
    /// Refusals land in the PIN-time slot; no network call is made for
    /// them.
    pub fn begin_pin_request(&mut self) -> Option<PinTicket> {
        self.pin_error = None;

        // Stage legality first: the exchange must be able to land in
        // `PinDisplayed` before the role guards run.
        if let Err(e) = self.guard_transition(Stage::PinDisplayed) {
            self.pin_error = Some(e);
            return None;
        }

        let session_role = self.session.role();
        match self.pin_availability() {
            PinAvailability::Ready => {}
            // Ruled out by the stage guard above.
            PinAvailability::NotReviewing => return None,
            PinAvailability::DeviceUnresolved => {
                warn!("PIN request blocked: device never resolved");
                self.pin_error = Some(Error::DeviceUnresolved);
                return None;
            }
            PinAvailability::NoRoleAssigned => {
                warn!("PIN request blocked: device has no role assigned");
                self.pin_error = Some(Error::NoRoleAssigned);
                return None;
            }
            PinAvailability::RoleMismatch => {
                let device = self
                    .device_identity()
                    .map(|identity| identity.role)
                    .unwrap_or_default();
                warn!(device_role = %device, session_role = %session_role, "PIN request blocked: role mismatch");
                self.pin_error = Some(Error::RoleMismatch {
                    device,
                    session: session_role,
                });
                return None;
            }
        }

        let WorkflowState::Reviewing(session) = &self.state else {
            return None;
        };
        let resolved = session.resolved.as_ref()?;

        info!(mac = %session.request.mac_address, "requesting PIN");
        Some(PinTicket {
            generation: self.generation,
            request: PinRequest {
                mac_address: session.request.mac_address.clone(),
                guid: resolved.identity.guid.clone(),
                role: session_role,
                secret_key: resolved.secret_key.clone(),
            },
        })
    }

    /// Apply the outcome of a PIN generation exchange.
    ///
    /// Success moves the workflow to `PinDisplayed`; failure stays in
    /// `Reviewing` with the PIN-time slot set and the PIN unset. A stale
    /// ticket is discarded.
    pub fn complete_pin_request(&mut self, ticket: PinTicket, outcome: Result<Pin>) {
        if ticket.generation != self.generation {
            debug!("discarding PIN for a superseded scan");
            return;
        }

        match outcome {
            Ok(pin) => {
                if let WorkflowState::Reviewing(session) = &self.state {
                    info!("PIN generated");
                    let mut session = session.clone();
                    session.pin = Some(pin);
                    self.pin_error = None;
                    if let Err(e) = self.enter(WorkflowState::PinDisplayed(session)) {
                        self.pin_error = Some(e);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "PIN generation failed");
                self.pin_error = Some(e);
            }
        }
    }

    /// Return from the PIN view to the scanned data. Identity and PIN are
    /// both retained.
    pub fn view_scanned_data(&mut self) -> &WorkflowState {
        let next = match &self.state {
            WorkflowState::PinDisplayed(session) | WorkflowState::Reviewing(session) => {
                WorkflowState::Reviewing(session.clone())
            }
            // No scanned data to go back to.
            WorkflowState::Scanning => {
                self.pin_error = Some(Error::InvalidStateTransition {
                    from: Stage::Scanning.to_string(),
                    to: Stage::Reviewing.to_string(),
                });
                return &self.state;
            }
        };

        self.pin_error = None;
        if let Err(e) = self.enter(next) {
            self.pin_error = Some(e);
        }
        &self.state
    }

    /// Abandon the current scan and return to `Scanning`.
    ///
    /// Clears the scanned request, device identity, cached secret key, PIN,
    /// and both error slots, and supersedes any in-flight exchange.
    pub fn reset(&mut self) -> &WorkflowState {
        info!("workflow reset");
        self.generation = self.generation.next();
        self.scan_error = None;
        self.pin_error = None;
        if let Err(e) = self.enter(WorkflowState::Scanning) {
            self.scan_error = Some(e);
        }
        &self.state
    }

    /// Check the transition table for an edge out of the current stage.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` when the table forbids it.
    fn guard_transition(&self, to: Stage) -> Result<()> {
        let from = self.state.stage();
        if !from.can_transition_to(&to) {
            warn!(%from, %to, "transition rejected");
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// Perform a transition and record it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` without touching state when
    /// the transition table forbids the edge.
    fn enter(&mut self, next: WorkflowState) -> Result<()> {
        let to = next.stage();
        self.guard_transition(to)?;

        let from = self.state.stage();
        debug!(%from, %to, "workflow transition");
        self.state = next;
        self.history.push_back(StageTransition::new(from, to));
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        Ok(())
    }
}
