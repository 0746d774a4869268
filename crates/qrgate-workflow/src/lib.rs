//! Access workflow controller for QR-code gated device unlocking.
//!
//! This crate owns the scan-to-PIN state machine: raw QR text (or an
//! uploaded image) becomes a [`qrgate_core::ScannedAccessRequest`], the
//! backend resolves it into a secret key and decrypted device identity, a
//! role-match guard decides whether PIN generation is allowed, and a
//! one-time PIN moves the workflow into its final display state.
//!
//! # States
//!
//! - `Scanning`: waiting for a QR code
//! - `Reviewing`: a payload was scanned; the device identity may or may not
//!   have resolved
//! - `PinDisplayed`: a PIN was generated for the reviewed device
//!
//! Errors never escape the controller; they land in one of two
//! user-visible message slots (scan-time and PIN-time) that a UI renders.

pub mod controller;
pub mod state;

pub use controller::{
    AccessWorkflow, PinAvailability, PinTicket, ScanGeneration, ScanTicket, resolve_access,
};
pub use state::{ResolvedDevice, ScanSession, Stage, StageTransition, WorkflowState};
