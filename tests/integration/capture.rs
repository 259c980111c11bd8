//! Capture integration tests
//!
//! Loopback resolution, sample-exact capture, capacity clamping, completion
//! and stream errors.

use looptap::prelude::*;
use looptap::{DeviceInfo, EngineEvent, Error, Sawtooth, StopReason};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::tolerances::FLOAT_EPSILON;
use helpers::*;

/// Captured samples match what the loopback device delivered.
#[test]
fn test_capture_copies_samples() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    engine.begin_record(Instant::now()).unwrap();

    let mut saw = Sawtooth::new();
    let input = saw.take(300, 2);
    pump_capture(&backend, &input, 2, TEST_BUFFER_SIZE);
    assert_eq!(engine.end_record().unwrap(), 300);

    let view = engine.view();
    assert_eq!(view.recorded_frames(), 300);
    let left = view.channel_samples(0, 0..300);
    let right = view.channel_samples(1, 0..300);
    for (frame, (l, r)) in left.iter().zip(&right).enumerate() {
        assert!((l - input[frame * 2]).abs() < FLOAT_EPSILON);
        assert!((r - input[frame * 2 + 1]).abs() < FLOAT_EPSILON);
    }
}

/// Frames past the capacity are dropped and the stream completes.
#[test]
fn test_capture_clamps_to_capacity() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.02); // 160 frames
    let t0 = Instant::now();
    engine.begin_record(t0).unwrap();

    let input = generate_sine(300.0, 1000, 2);
    pump_capture(&backend, &input, 2, TEST_BUFFER_SIZE);
    let view = engine.view();
    assert_eq!(view.write_index(), 160);

    assert_eq!(
        poll_until_idle(&mut engine, t0, 5),
        PollOutcome::Finished { frames: 160 }
    );
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(view.recorded_frames(), 160);
    assert!(!backend.has_open_input());
}

/// Null input periods record silence.
#[test]
fn test_capture_null_input_is_silence() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 128);
    engine.end_record().unwrap();

    let samples = engine.view().channel_samples(0, 0..128);
    assert_eq!(samples.len(), 128);
    assert!(is_silent(&samples));
}

/// A second recording replaces the first.
#[test]
fn test_capture_rerecord_replaces_buffer() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);

    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(Some(&generate_sine(100.0, 500, 2)), 500);
    engine.end_record().unwrap();
    let first = engine.view().buffer();

    engine.begin_record(Instant::now()).unwrap();
    let second = engine.view().buffer();
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(second.write_index(), 0);
    backend.pump_input(None, 50);
    assert_eq!(engine.end_record().unwrap(), 50);
    assert_eq!(first.recorded_frames(), 500);
}

/// No loopback device: start fails, nothing opened, previous take kept.
#[test]
fn test_capture_device_unavailable() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 40);
    engine.end_record().unwrap();

    backend.set_devices(vec![DeviceInfo::output(0, "Speakers", 2, 8000)], Some(0));
    let err = engine.begin_record(Instant::now()).unwrap_err();
    assert_eq!(err, Error::Core(looptap::core::Error::DeviceUnavailable));
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.view().recorded_frames(), 40);
    assert_eq!(backend.open_count(), 1);
}

/// Loopback of a different output is not picked.
#[test]
fn test_capture_ignores_other_outputs_loopback() {
    let backend = test_backend();
    backend.set_devices(
        vec![
            DeviceInfo::input(0, "USB Interface [Loopback]", 2, 8000),
            DeviceInfo::output(1, "Speakers", 2, 8000),
            DeviceInfo::input(2, "Speakers [Loopback]", 2, 8000),
        ],
        Some(1),
    );
    let mut engine = test_engine(&backend, 0.5);
    let started = engine.begin_record(Instant::now()).unwrap();
    assert_eq!(started.device.index, 2);
}

/// Open and start failures leave the engine idle with nothing left open.
#[test]
fn test_capture_stream_failures_roll_back() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);

    backend.fail_next_open("exclusive mode");
    let err = engine.begin_record(Instant::now()).unwrap_err();
    assert!(matches!(
        err,
        Error::Core(looptap::core::Error::StreamOpenFailed(_))
    ));
    assert!(err.is_recoverable());

    backend.fail_next_start("no clock");
    let err = engine.begin_record(Instant::now()).unwrap_err();
    assert!(matches!(
        err,
        Error::Core(looptap::core::Error::StreamStartFailed(_))
    ));

    assert_eq!(engine.phase(), Phase::Idle);
    assert!(!backend.has_open_input());

    // Still usable afterwards.
    engine.begin_record(Instant::now()).unwrap();
    assert_eq!(engine.phase(), Phase::Recording);
}

/// A host error mid-capture tears down like completion and reports it.
#[test]
fn test_capture_runtime_error() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    let events = engine.events();
    let t0 = Instant::now();
    engine.begin_record(t0).unwrap();
    backend.pump_input(None, 96);
    backend.fail_active_streams("device unplugged");

    // Periods after the error are not recorded.
    backend.pump_input(None, 96);

    let outcome = poll_until_idle(&mut engine, t0, 5);
    assert!(matches!(outcome, PollOutcome::Errored { frames: 96, .. }));
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.view().recorded_frames(), 96);

    let tail: Vec<_> = events.try_iter().skip(1).collect();
    assert_eq!(
        tail,
        vec![
            EngineEvent::StreamError("Audio stream reported an error: device unplugged".into()),
            EngineEvent::RecordStopped {
                frames: 96,
                reason: StopReason::Errored,
            },
        ]
    );
}
