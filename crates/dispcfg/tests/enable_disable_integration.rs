//! Session and orchestrator behaviour against the in-memory display service.

use dispcfg::application::apply_retry::ApplyState;
use dispcfg::application::boundary::{ApplyFlags, ERROR_GEN_FAILURE, ERROR_INSUFFICIENT_BUFFER};
use dispcfg::application::session::{DisplaySession, SessionOptions};
use dispcfg::application::snapshot::SnapshotOptions;
use dispcfg::infrastructure::native::fake::FakeDisplayConfigApi;
use dispcfg_core::builder::{DisplaySpec, TopologyBuilder};
use dispcfg_core::{AdapterId, DisplayId, EnableDisableRequest, Point, Region, TopologyError};

const GPU: AdapterId = AdapterId::new(0x4411, 0);

/// Displays 1 and 2 side by side, display 3 connected but off.
fn fake() -> FakeDisplayConfigApi {
    let mut builder = TopologyBuilder::new();
    builder
        .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
        .push(DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)))
        .push(DisplaySpec::inactive(GPU, 3));
    FakeDisplayConfigApi::new(builder.build())
}

fn open(api: FakeDisplayConfigApi) -> DisplaySession<FakeDisplayConfigApi> {
    DisplaySession::open(api, SessionOptions::default()).expect("session opens")
}

fn swap_request() -> EnableDisableRequest {
    EnableDisableRequest { enable: vec![DisplayId(3)], disable: vec![DisplayId(2)], as_clone: false }
}

// ── enable / disable ──────────────────────────────────────────────────────────

#[test]
fn test_enable_disable_succeeds_on_first_attempt() {
    // Arrange
    let mut session = open(fake());

    // Act
    let state = session.enable_disable(&swap_request());

    // Assert
    assert_eq!(state, Ok(ApplyState::Primary));
    let topology = session.topology();
    assert_eq!(topology.is_active(DisplayId(3)), Ok(true));
    assert_eq!(topology.is_active(DisplayId(2)), Ok(false));
    assert_eq!(topology.position(DisplayId(3)), Ok(Point::new(1920, 0)));

    let submissions = session.api().submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].flags, ApplyState::Primary.flags());
    assert!(submissions[0].modes.is_none());
}

#[test]
fn test_generic_failure_falls_back_and_recycles_freed_source_id() {
    // Arrange
    let api = fake();
    api.fail_next_apply(ERROR_GEN_FAILURE);
    let mut session = open(api);

    // Act
    let state = session.enable_disable(&swap_request());

    // Assert
    assert_eq!(state, Ok(ApplyState::Fallback));
    let submissions = session.api().submissions();
    assert_eq!(submissions.len(), 2);
    let fallback = &submissions[1];
    assert_eq!(fallback.flags, ApplyState::Fallback.flags());
    assert!(fallback.modes.is_some());
    assert_eq!(fallback.paths[2].source.id, 1);
    assert_eq!(session.topology().is_active(DisplayId(3)), Ok(true));
}

#[test]
fn test_generic_failure_is_returned_when_fallback_is_disabled() {
    let api = fake();
    api.fail_next_apply(ERROR_GEN_FAILURE);
    let mut options = SessionOptions::default();
    options.retry.fallback_enabled = false;
    let mut session = DisplaySession::open(api, options).unwrap();

    let result = session.enable_disable(&swap_request());

    assert_eq!(result.unwrap_err().native_code(), Some(ERROR_GEN_FAILURE));
    assert_eq!(session.api().submissions().len(), 1);
    assert_eq!(session.topology().is_active(DisplayId(2)), Ok(true));
}

#[test]
fn test_disable_many_skips_unknown_ids() {
    let mut session = open(fake());

    let state = session.disable_many(&[DisplayId(9), DisplayId(2)]);

    assert_eq!(state, Ok(ApplyState::Primary));
    assert_eq!(session.topology().is_active(DisplayId(2)), Ok(false));
    assert_eq!(session.topology().is_active(DisplayId(1)), Ok(true));
}

#[test]
fn test_enable_as_clone_shares_one_position() {
    let api = fake();
    let mut session = open(api);
    session.disable_many(&[DisplayId(2)]).unwrap();

    let state = session.enable(&[DisplayId(2), DisplayId(3)], true);

    assert_eq!(state, Ok(ApplyState::Primary));
    let topology = session.topology();
    assert_eq!(topology.position(DisplayId(2)), topology.position(DisplayId(3)));
    assert_eq!(topology.clone_peers(DisplayId(2)), Ok(vec![DisplayId(3)]));
}

// ── snapshot negotiation ──────────────────────────────────────────────────────

#[test]
fn test_snapshot_retries_while_configuration_changes() {
    let api = fake();
    api.report_insufficient_buffer(3);

    let session = open(api);

    assert_eq!(session.displays().unwrap().len(), 3);
}

#[test]
fn test_snapshot_gives_up_after_max_attempts() {
    let api = fake();
    api.report_insufficient_buffer(10);
    let options = SessionOptions {
        snapshot: SnapshotOptions { max_attempts: 2, ..SnapshotOptions::default() },
        ..SessionOptions::default()
    };

    let result = DisplaySession::open(api, options);

    assert_eq!(
        result.err(),
        Some(TopologyError::NativeApi {
            operation: "QueryDisplayConfig",
            code: ERROR_INSUFFICIENT_BUFFER,
        })
    );
}

// ── edits ─────────────────────────────────────────────────────────────────────

#[test]
fn test_set_primary_is_committed_with_supplied_modes() {
    // Arrange
    let mut session = open(fake());

    // Act
    session.set_primary(DisplayId(2)).unwrap();

    // Assert
    assert_eq!(session.topology().primary_display(), Some(DisplayId(2)));
    assert_eq!(session.topology().position(DisplayId(1)), Ok(Point::new(-1920, 0)));
    let flags = session.api().submissions()[0].flags;
    assert!(flags.contains(ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG));
    assert!(flags.contains(ApplyFlags::SAVE_TO_DATABASE));
}

#[test]
fn test_clone_display_is_visible_after_refresh() {
    let mut session = open(fake());

    session.clone_display(DisplayId(1), &[DisplayId(2)]).unwrap();

    let topology = session.topology();
    assert_eq!(topology.position(DisplayId(2)), Ok(Point::ORIGIN));
    assert_eq!(topology.clone_peers(DisplayId(1)), Ok(vec![DisplayId(2)]));
}

#[test]
fn test_failed_edit_submits_nothing() {
    let mut session = open(fake());

    let result = session.disable(DisplayId(1));

    assert_eq!(result, Err(TopologyError::CannotDisablePrimary(DisplayId(1))));
    assert!(session.api().submissions().is_empty());
}

#[test]
fn test_preferred_mode_comes_from_the_service() {
    let session = open(fake());

    let mode = session.preferred_mode(DisplayId(3)).unwrap();

    assert_eq!((mode.width, mode.height), (1920, 1080));
}
