//! Transport integration tests
//!
//! Phase gating between capture and playback, idempotent stops, and the
//! speed ratio.

use looptap::prelude::*;
use looptap::{Error, TransportRequest};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::*;

fn assert_rejected(err: Error, request: TransportRequest, phase: Phase) {
    assert_eq!(
        err,
        Error::Core(looptap::core::Error::InvalidTransition { request, phase })
    );
}

/// begin-play while recording: rejected, still recording, nothing opened.
#[test]
fn test_transport_play_blocked_while_recording() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 32);
    let buffer = engine.view().buffer();

    let err = engine.begin_play(Instant::now()).unwrap_err();
    assert_rejected(err, TransportRequest::BeginPlay, Phase::Recording);
    assert_eq!(engine.phase(), Phase::Recording);
    assert!(!backend.has_open_output());
    assert_eq!(backend.open_count(), 1);
    assert!(std::sync::Arc::ptr_eq(&buffer, &engine.view().buffer()));
}

/// begin-record while playing: rejected, playback continues.
#[test]
fn test_transport_record_blocked_while_playing() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.05);
    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 200);
    engine.end_record().unwrap();
    engine.begin_play(Instant::now()).unwrap();

    let err = engine.begin_record(Instant::now()).unwrap_err();
    assert_rejected(err, TransportRequest::BeginRecord, Phase::Playing);
    assert_eq!(engine.phase(), Phase::Playing);
    assert!(!backend.has_open_input());
    assert!(backend.has_open_output());
}

/// Stopping twice: second call rejected, stream closed once.
#[test]
fn test_transport_stop_is_idempotent() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);

    let err = engine.end_record().unwrap_err();
    assert_rejected(err, TransportRequest::EndRecord, Phase::Idle);
    let err = engine.end_play().unwrap_err();
    assert_rejected(err, TransportRequest::EndPlay, Phase::Idle);

    engine.begin_record(Instant::now()).unwrap();
    engine.end_record().unwrap();
    let err = engine.end_record().unwrap_err();
    assert_rejected(err, TransportRequest::EndRecord, Phase::Idle);
    assert_eq!(backend.close_count(), 1);
}

/// end-play while recording is rejected and leaves the capture alone.
#[test]
fn test_transport_cross_stop_rejected() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    engine.begin_record(Instant::now()).unwrap();

    let err = engine.end_play().unwrap_err();
    assert!(err.is_invalid_transition());
    assert_eq!(engine.phase(), Phase::Recording);
    assert!(backend.has_open_input());
}

/// Toggle buttons alternate through the full cycle.
#[test]
fn test_transport_toggle_cycle() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    let now = Instant::now();

    engine.dispatch(Action::ToggleRecord, now).unwrap();
    assert_eq!(engine.phase(), Phase::Recording);
    backend.pump_input(None, 256);
    engine.dispatch(Action::ToggleRecord, now).unwrap();
    assert_eq!(engine.phase(), Phase::Idle);

    engine.dispatch(Action::TogglePlay, now).unwrap();
    assert_eq!(engine.phase(), Phase::Playing);
    engine.dispatch(Action::TogglePlay, now).unwrap();
    assert_eq!(engine.phase(), Phase::Idle);

    // Play toggle while recording still goes through the gate.
    engine.dispatch(Action::ToggleRecord, now).unwrap();
    let err = engine.dispatch(Action::TogglePlay, now).unwrap_err();
    assert!(err.is_invalid_transition());
}

/// The speed ratio can change in any phase and is clamped at play time.
#[test]
fn test_transport_speed_ratio() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);

    engine.set_speed_ratio(5.0).unwrap();
    assert_eq!(engine.transport().speed_ratio(), 5.0);
    assert_eq!(engine.transport().effective_speed_ratio(), 2.0);

    engine.begin_record(Instant::now()).unwrap();
    engine.set_speed_ratio(0.75).unwrap();
    assert_eq!(engine.phase(), Phase::Recording);

    for bad in [0.0, -1.0, f64::INFINITY, f64::NAN] {
        assert!(engine.set_speed_ratio(bad).is_err());
    }
    assert_eq!(engine.transport().speed_ratio(), 0.75);
}
