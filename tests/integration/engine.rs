//! Engine integration tests
//!
//! Builder, event stream, render view and device listing.

use approx::assert_abs_diff_eq;
use looptap::prelude::*;
use looptap::{DeviceInfo, StopReason};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::*;

/// A fresh engine is idle with an empty, full-capacity buffer.
#[test]
fn test_engine_initial_state() {
    let backend = test_backend();
    let engine = test_engine(&backend, 0.5);

    assert_eq!(engine.phase(), Phase::Idle);
    let view = engine.view();
    assert_eq!(view.capacity_frames(), 4000);
    assert_eq!(view.channels(), 2);
    assert_eq!(view.sample_rate(), TEST_SAMPLE_RATE);
    assert_eq!(view.recorded_frames(), 0);
    assert_eq!(view.write_index(), 0);
    assert!(!backend.has_open_input());
    assert!(!backend.has_open_output());
}

/// Full record-then-play cycle produces the expected event sequence.
#[test]
fn test_engine_event_sequence() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.05);
    let events = engine.events();
    let t0 = Instant::now();

    engine.begin_record(t0).unwrap();
    let input = generate_sine(440.0, 400, 2);
    pump_capture(&backend, &input, 2, TEST_BUFFER_SIZE);
    let outcome = poll_until_idle(&mut engine, t0, 10);
    assert_eq!(outcome, PollOutcome::Finished { frames: 400 });

    engine.begin_play(t0).unwrap();
    pump_playback(&backend, 8, TEST_BUFFER_SIZE);
    let outcome = poll_until_idle(&mut engine, t0, 10);
    assert_eq!(outcome, PollOutcome::Finished { frames: 400 });

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            EngineEvent::RecordStarted {
                device: format!("{} [Loopback]", TEST_OUTPUT_NAME),
                capacity_frames: 400,
            },
            EngineEvent::RecordStopped {
                frames: 400,
                reason: StopReason::Completed,
            },
            EngineEvent::PlayStarted {
                frames: 400,
                speed_ratio: 1.0,
            },
            EngineEvent::PlayStopped {
                frames: 400,
                reason: StopReason::Completed,
            },
        ]
    );
}

/// Redraw ticks arrive while a capture runs.
#[test]
fn test_engine_redraw_ticks() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    let events = engine.events();
    let t0 = Instant::now();
    engine.begin_record(t0).unwrap();
    events.try_iter().for_each(drop);

    for tick in 1..=3 {
        backend.pump_input(None, TEST_BUFFER_SIZE);
        let outcome = engine.poll(t0 + engine.poll_interval() * tick);
        assert_eq!(outcome, PollOutcome::Active);
    }
    let redraws = events
        .try_iter()
        .filter(|e| *e == EngineEvent::Redraw)
        .count();
    assert_eq!(redraws, 3);
}

/// Renderer cursor follows the write index during capture.
#[test]
fn test_engine_view_incremental_redraw() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    let view = engine.view();
    engine.begin_record(Instant::now()).unwrap();

    backend.pump_input(Some(&generate_sine(200.0, 64, 2)), 64);
    assert_eq!(view.pending_span(), 0..64);
    view.mark_rendered(64);

    backend.pump_input(Some(&generate_sine(200.0, 64, 2)), 64);
    assert_eq!(view.pending_span(), 64..128);
    assert_abs_diff_eq!(view.progress(), 128.0 / 4000.0, epsilon = 1e-9);

    view.reset_cursor();
    assert_eq!(view.pending_span(), 0..128);
}

/// A new recording starts the redraw cursor over.
#[test]
fn test_engine_view_cursor_resets_on_new_recording() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);
    let view = engine.view();

    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 100);
    view.mark_rendered(100);
    engine.end_record().unwrap();

    engine.begin_record(Instant::now()).unwrap();
    backend.pump_input(None, 10);
    assert_eq!(view.pending_span(), 0..10);
}

#[test]
fn test_engine_list_devices() {
    let backend = test_backend();
    let engine = test_engine(&backend, 0.5);
    let lines = engine.list_devices().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0: Test Speakers"));
    assert!(lines[1].contains("[Loopback]"));
}

/// Hot-plugged devices are picked up on the next record.
#[test]
fn test_engine_device_change_between_recordings() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 0.5);

    backend.set_devices(
        vec![
            DeviceInfo::output(0, "Headphones", 2, 8000),
            DeviceInfo::input(1, "Headphones [Loopback]", 2, 8000),
        ],
        Some(0),
    );
    let started = engine.begin_record(Instant::now()).unwrap();
    assert_eq!(started.device.name, "Headphones [Loopback]");
}

/// A host that never reads events does not grow the queue without limit.
#[test]
fn test_engine_event_queue_bounded_without_consumer() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 100.0);
    let events = engine.events();
    let t0 = Instant::now();
    engine.begin_record(t0).unwrap();

    let mut now = t0;
    for _ in 0..100_000 {
        now += engine.poll_interval();
        engine.poll(now);
    }
    assert!(events.len() <= looptap::EVENT_QUEUE_CAPACITY);

    engine.end_record().unwrap();
    assert!(events
        .try_iter()
        .any(|e| matches!(e, EngineEvent::RecordStopped { reason: StopReason::User, .. })));
}
