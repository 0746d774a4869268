//! End-to-end workflow scenarios
//!
//! These tests drive the controller with the scriptable mock API and the
//! mock image decoder, covering the full scan-review-PIN flow, the guard
//! and ordering properties, and cancellation via generation tags.

use qrgate_api::{MockApi, MockApiHandle, RecordedCall};
use qrgate_core::{ApiOperation, DeviceIdentity, Error, Pin, RoleCode, SecretKey};
use qrgate_qr::MockImageDecoder;
use qrgate_session::{SessionContext, SessionStore};
use qrgate_workflow::{
    AccessWorkflow, PinAvailability, ResolvedDevice, Stage, WorkflowState,
};
use rstest::rstest;

const PAYLOAD: &str = r#"{"macAddress":"AA:BB","encryptedData":"xyz"}"#;

fn identity(guid: &str, role: RoleCode) -> DeviceIdentity {
    DeviceIdentity {
        guid: guid.to_string(),
        board_version: "2.1".to_string(),
        serial_number: "SN-7".to_string(),
        role,
        ..DeviceIdentity::default()
    }
}

fn workflow_for(session_role: RoleCode) -> (AccessWorkflow<MockApi>, MockApiHandle) {
    let (api, handle) = MockApi::new();
    (
        AccessWorkflow::new(api, SessionContext::new(session_role)),
        handle,
    )
}

/// Script a successful resolution: key "K1", then the given identity.
fn queue_resolution(handle: &MockApiHandle, device_role: RoleCode) {
    handle.queue_secret_key(SecretKey::new("K1"));
    handle.queue_decrypt(Ok(identity("G1", device_role)));
}

/// Scenario A: matching roles enable PIN generation.
#[tokio::test]
async fn test_scan_with_matching_role_enables_pin() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);

    workflow.scan(PAYLOAD).await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert!(workflow.scan_error().is_none());
    assert_eq!(
        workflow.scanned_request().map(|r| r.mac_address.as_str()),
        Some("AA:BB")
    );
    assert_eq!(
        workflow.device_identity().map(|i| i.guid.as_str()),
        Some("G1")
    );
    assert_eq!(workflow.pin_availability(), PinAvailability::Ready);
    assert!(workflow.can_request_pin());
}

/// Scenario B: a role mismatch blocks the guard before any network call.
#[tokio::test]
async fn test_role_mismatch_blocks_without_network_call() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Maintainer);

    workflow.scan(PAYLOAD).await;
    let calls_before = handle.call_count();

    workflow.request_pin().await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert_eq!(
        workflow.pin_message().as_deref(),
        Some("Machine role is not same as logged-in role")
    );
    assert!(workflow.pin().is_none());
    // No /generate-pin call was made.
    assert_eq!(handle.call_count(), calls_before);
    assert!(
        !handle
            .calls()
            .iter()
            .any(|call| matches!(call, RecordedCall::GeneratePin { .. }))
    );
}

/// Scenario C: malformed payloads keep the workflow scanning.
#[tokio::test]
async fn test_malformed_payload_stays_scanning() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);

    workflow.scan("not-json").await;

    assert_eq!(workflow.stage(), Stage::Scanning);
    assert!(matches!(
        workflow.scan_error(),
        Some(Error::InvalidPayloadFormat { .. })
    ));
    assert_eq!(handle.call_count(), 0);
}

/// Scenario D: PIN generation failure stays in review with the PIN unset.
#[tokio::test]
async fn test_pin_generation_failure_stays_reviewing() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);
    handle.queue_pin(Err(Error::network(ApiOperation::GeneratePin)));

    workflow.scan(PAYLOAD).await;
    workflow.request_pin().await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert_eq!(
        workflow.pin_message().as_deref(),
        Some("Failed to generate PIN")
    );
    assert!(workflow.pin().is_none());
}

/// Scenario E: reset clears every trace of the scan.
#[tokio::test]
async fn test_reset_from_pin_displayed_clears_everything() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);
    handle.queue_pin(Pin::new("4821"));

    workflow.scan(PAYLOAD).await;
    workflow.request_pin().await;
    assert_eq!(workflow.stage(), Stage::PinDisplayed);

    workflow.reset();

    assert_eq!(workflow.state(), &WorkflowState::Scanning);
    assert!(workflow.scanned_request().is_none());
    assert!(workflow.device_identity().is_none());
    assert!(workflow.pin().is_none());
    assert!(workflow.scan_error().is_none());
    assert!(workflow.pin_error().is_none());
}

/// Guard matrix: every device-role / session-role pairing yields the
/// expected PIN affordance. The guard logic is synchronous; the split
/// begin/complete form drives it without touching the network.
#[rstest]
#[case(RoleCode::Admin, RoleCode::Admin, PinAvailability::Ready)]
#[case(RoleCode::Maintainer, RoleCode::Maintainer, PinAvailability::Ready)]
#[case(RoleCode::ServiceEngineer, RoleCode::ServiceEngineer, PinAvailability::Ready)]
#[case(RoleCode::Maintainer, RoleCode::Admin, PinAvailability::RoleMismatch)]
#[case(RoleCode::Admin, RoleCode::ServiceEngineer, PinAvailability::RoleMismatch)]
#[case(RoleCode::ServiceEngineer, RoleCode::Maintainer, PinAvailability::RoleMismatch)]
#[case(RoleCode::Unassigned, RoleCode::Admin, PinAvailability::NoRoleAssigned)]
#[case(RoleCode::Unassigned, RoleCode::Unassigned, PinAvailability::NoRoleAssigned)]
fn test_guard_matrix(
    #[case] device_role: RoleCode,
    #[case] session_role: RoleCode,
    #[case] expected: PinAvailability,
) {
    let (mut workflow, _handle) = workflow_for(session_role);
    let ticket = workflow.begin_scan(PAYLOAD).unwrap();
    workflow.complete_scan(
        ticket,
        Ok(ResolvedDevice {
            secret_key: SecretKey::new("K1").unwrap(),
            identity: identity("G1", device_role),
        }),
    );

    assert_eq!(workflow.pin_availability(), expected);
    assert_eq!(workflow.can_request_pin(), expected == PinAvailability::Ready);
}

/// Ordering property: the key is fetched, then decryption, then the PIN,
/// and the key is reused rather than re-fetched.
#[tokio::test]
async fn test_operations_run_in_order_and_reuse_the_key() {
    let (mut workflow, handle) = workflow_for(RoleCode::ServiceEngineer);
    queue_resolution(&handle, RoleCode::ServiceEngineer);
    handle.queue_pin(Pin::new("123456"));

    workflow.scan(PAYLOAD).await;
    workflow.request_pin().await;

    let calls = handle.calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(
        &calls[0],
        RecordedCall::FetchSecretKey { mac_address } if mac_address == "AA:BB"
    ));
    assert!(matches!(
        &calls[1],
        RecordedCall::Decrypt { mac_address, encrypted_data }
            if mac_address == "AA:BB" && encrypted_data == "xyz"
    ));
    let RecordedCall::GeneratePin { request } = &calls[2] else {
        panic!("expected a generate-pin call, got {:?}", calls[2]);
    };
    assert_eq!(request.mac_address, "AA:BB");
    assert_eq!(request.guid, "G1");
    // The session role travels in raw form.
    assert_eq!(request.role, RoleCode::ServiceEngineer);
    // The key fetched at scan time is reused.
    assert_eq!(request.secret_key, SecretKey::new("K1").unwrap());
}

/// A failed resolution still shows the scanned MAC address.
#[tokio::test]
async fn test_resolution_failure_enters_review_without_identity() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    handle.queue_secret_key(Err(Error::network(ApiOperation::FetchSecretKey)));

    workflow.scan(PAYLOAD).await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert!(workflow.device_identity().is_none());
    assert_eq!(
        workflow.scan_message().as_deref(),
        Some("Failed to process QR code")
    );
    assert_eq!(
        workflow.scanned_request().map(|r| r.mac_address.as_str()),
        Some("AA:BB")
    );
    // Decryption is never attempted once the key fetch fails.
    assert_eq!(handle.call_count(), 1);
    assert_eq!(workflow.pin_availability(), PinAvailability::DeviceUnresolved);
}

/// A decryption failure after a successful key fetch behaves the same way.
#[tokio::test]
async fn test_decrypt_failure_enters_review_without_identity() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    handle.queue_secret_key(SecretKey::new("K1"));
    handle.queue_decrypt(Err(Error::network(ApiOperation::Decrypt)));

    workflow.scan(PAYLOAD).await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert!(workflow.device_identity().is_none());
    assert_eq!(
        workflow.scan_message().as_deref(),
        Some("Failed to process QR code")
    );
}

/// Viewing the scanned data back from the PIN view loses nothing, and a
/// regenerated PIN replaces the old one.
#[tokio::test]
async fn test_view_scanned_data_retains_identity_and_pin() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);
    handle.queue_pin(Pin::new("4821"));

    workflow.scan(PAYLOAD).await;
    workflow.request_pin().await;
    assert_eq!(workflow.pin().map(Pin::as_str), Some("4821"));

    workflow.view_scanned_data();
    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert_eq!(workflow.pin().map(Pin::as_str), Some("4821"));
    assert!(workflow.device_identity().is_some());

    // Regenerating replaces the cached PIN.
    handle.queue_pin(Pin::new("9999"));
    workflow.request_pin().await;
    assert_eq!(workflow.stage(), Stage::PinDisplayed);
    assert_eq!(workflow.pin().map(Pin::as_str), Some("9999"));
}

/// A second PIN request after a failure reuses the cached key.
#[tokio::test]
async fn test_retry_after_pin_failure_does_not_refetch_key() {
    let (mut workflow, handle) = workflow_for(RoleCode::Maintainer);
    queue_resolution(&handle, RoleCode::Maintainer);
    handle.queue_pin(Err(Error::network(ApiOperation::GeneratePin)));
    handle.queue_pin(Pin::new("271828"));

    workflow.scan(PAYLOAD).await;
    workflow.request_pin().await;
    assert_eq!(workflow.stage(), Stage::Reviewing);

    workflow.request_pin().await;
    assert_eq!(workflow.stage(), Stage::PinDisplayed);
    assert!(workflow.pin_error().is_none());

    let fetches = handle
        .calls()
        .iter()
        .filter(|call| matches!(call, RecordedCall::FetchSecretKey { .. }))
        .count();
    assert_eq!(fetches, 1);
}

/// An uploaded image with no symbol is a distinct scan-time error.
#[tokio::test]
async fn test_image_upload_without_symbol() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    let decoder = MockImageDecoder::new();
    decoder.push_no_symbol();

    workflow.scan_image(&decoder, b"raster-bytes").await;

    assert_eq!(workflow.stage(), Stage::Scanning);
    assert!(matches!(workflow.scan_error(), Some(Error::NoCodeFound)));
    assert_eq!(
        workflow.scan_message().as_deref(),
        Some("No QR code found in image")
    );
    assert_eq!(handle.call_count(), 0);
}

/// An uploaded image whose symbol decodes to malformed text is a format
/// error, distinct from the missing-symbol case.
#[tokio::test]
async fn test_image_upload_with_malformed_symbol() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    let decoder = MockImageDecoder::new();
    decoder.push_symbol("not-json");

    workflow.scan_image(&decoder, b"raster-bytes").await;

    assert_eq!(workflow.stage(), Stage::Scanning);
    assert!(matches!(
        workflow.scan_error(),
        Some(Error::InvalidPayloadFormat { .. })
    ));
    assert_eq!(handle.call_count(), 0);
}

/// An uploaded image with a symbol flows like a camera scan.
#[tokio::test]
async fn test_image_upload_with_symbol_scans() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);

    let decoder = MockImageDecoder::new();
    decoder.push_symbol(PAYLOAD);

    workflow.scan_image(&decoder, b"raster-bytes").await;

    assert_eq!(workflow.stage(), Stage::Reviewing);
    assert!(workflow.can_request_pin());
}

/// A new successful scan clears the previous scan-time error.
#[tokio::test]
async fn test_successful_scan_clears_previous_error() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);

    workflow.scan("not-json").await;
    assert!(workflow.scan_error().is_some());

    queue_resolution(&handle, RoleCode::Admin);
    workflow.scan(PAYLOAD).await;

    assert!(workflow.scan_error().is_none());
    assert_eq!(workflow.stage(), Stage::Reviewing);
}

/// The login flow feeds the session store, which derives the context the
/// workflow is constructed with; the guard compares against that role.
#[tokio::test]
async fn test_login_session_drives_the_guard() {
    let login: qrgate_api::LoginResponse =
        serde_json::from_str(r#"{"roles":"Maintainer","name":"Ada"}"#).unwrap();
    let mut store = SessionStore::new();
    store.store_login(&login).unwrap();
    let context = SessionContext::from_store(&store).unwrap();

    let (api, handle) = MockApi::new();
    let mut workflow = AccessWorkflow::new(api, context);
    queue_resolution(&handle, RoleCode::Maintainer);

    workflow.scan(PAYLOAD).await;
    assert!(workflow.can_request_pin());

    // Logout clears the store; the workflow context is unaffected until
    // the controller itself is dropped.
    store.clear();
    assert!(store.is_empty());
}

/// A reset while resolution is in flight supersedes the scan: the late
/// outcome is discarded.
#[tokio::test]
async fn test_reset_mid_resolution_discards_late_outcome() {
    let (mut workflow, handle) = workflow_for(RoleCode::Admin);
    queue_resolution(&handle, RoleCode::Admin);

    let ticket = workflow.begin_scan(PAYLOAD).unwrap();
    // The handle exposes a second view over the same scripted state, so
    // the resolve step can run outside the controller.
    let api = handle.api();
    let outcome = qrgate_workflow::resolve_access(&api, ticket.request()).await;

    workflow.reset();
    workflow.complete_scan(ticket, outcome);

    assert_eq!(workflow.stage(), Stage::Scanning);
    assert!(workflow.device_identity().is_none());
}
