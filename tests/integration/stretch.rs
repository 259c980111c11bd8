//! Time-stretch integration tests
//!
//! Duration, clamping, pitch and level of the stretch applied at play time.

use looptap::prelude::*;

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::tolerances::{LENGTH_TOLERANCE_FRAMES, LEVEL_TOLERANCE};
use helpers::*;

fn record(engine: &mut LooptapEngine, backend: &looptap::ManualBackend, input: &[f32]) {
    engine.begin_record(Instant::now()).unwrap();
    pump_capture(backend, input, 2, TEST_BUFFER_SIZE);
    engine.end_record().unwrap();
}

fn played_frames(engine: &mut LooptapEngine) -> usize {
    match engine.begin_play(Instant::now()).unwrap() {
        PlayOutcome::Started(report) => report.output_frames,
        PlayOutcome::NothingRecorded => 0,
    }
}

/// Zero crossings per sample, a crude pitch estimate.
fn crossing_rate(samples: &[f32]) -> f32 {
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
        .count();
    crossings as f32 / samples.len() as f32
}

/// Output duration is recorded / speed for in-range ratios.
#[test]
fn test_stretch_duration_follows_speed() {
    for (speed, expected) in [(2.0, 2000), (1.5, 2667), (0.75, 5333), (0.5, 8000)] {
        let backend = test_backend();
        let mut engine = test_engine(&backend, 1.0);
        record(&mut engine, &backend, &generate_sine(220.0, 4000, 2));
        engine.set_speed_ratio(speed).unwrap();

        let frames = played_frames(&mut engine) as i64;
        assert!(
            (frames - expected).abs() <= LENGTH_TOLERANCE_FRAMES,
            "speed {}: {} frames",
            speed,
            frames
        );
        assert_eq!(engine.view().recorded_frames() as i64, frames);
    }
}

/// Five frames at double speed come out as three, not five or ten.
#[test]
fn test_stretch_tiny_recording() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 1.0);
    record(&mut engine, &backend, &generate_sine(220.0, 5, 2));
    engine.set_speed_ratio(2.0).unwrap();
    assert_eq!(played_frames(&mut engine), 3);
}

/// Ratios outside 0.5-2.0 are clamped at play time.
#[test]
fn test_stretch_clamps_ratio() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 1.0);
    record(&mut engine, &backend, &generate_sine(220.0, 1000, 2));
    engine.set_speed_ratio(10.0).unwrap();

    let PlayOutcome::Started(report) = engine.begin_play(Instant::now()).unwrap() else {
        panic!("playback did not start");
    };
    assert_eq!(report.speed_ratio, 2.0);
    assert_eq!(report.time_ratio, 0.5);
    assert_eq!(report.output_frames, 500);
}

/// Pitch holds and level is restored when the duration changes.
#[test]
fn test_stretch_keeps_pitch_and_level() {
    let input = generate_sine(440.0, 8000, 2);
    let left_in = channel(&input, 2, 0);

    for speed in [0.5, 2.0] {
        let backend = test_backend();
        let mut engine = test_engine(&backend, 1.0);
        record(&mut engine, &backend, &input);
        engine.set_speed_ratio(speed).unwrap();
        let frames = played_frames(&mut engine);

        let left_out = engine.view().channel_samples(0, 0..frames);
        let body = &left_out[1024..frames - 1024];
        let pitch_in = crossing_rate(&left_in);
        let pitch_out = crossing_rate(body);
        assert!(
            (pitch_out - pitch_in).abs() / pitch_in < 0.05,
            "speed {}: crossing rate {} vs {}",
            speed,
            pitch_out,
            pitch_in
        );

        let level = rms(&left_out) / rms(&left_in);
        assert!(
            (level - 1.0).abs() < LEVEL_TOLERANCE,
            "speed {}: level {}",
            speed,
            level
        );
    }
}

/// Each play stretches the current buffer again.
#[test]
fn test_stretch_compounds_across_plays() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 1.0);
    record(&mut engine, &backend, &generate_sine(220.0, 4000, 2));
    engine.set_speed_ratio(2.0).unwrap();

    assert_eq!(played_frames(&mut engine), 2000);
    engine.end_play().unwrap();
    assert_eq!(played_frames(&mut engine), 1000);
}

/// Slowing down then speeding up by the same factor restores the length.
#[test]
fn test_stretch_round_trip_duration() {
    let backend = test_backend();
    let mut engine = test_engine(&backend, 1.0);
    record(&mut engine, &backend, &generate_sine(330.0, 6000, 2));

    engine.set_speed_ratio(1.0 / 1.5).unwrap();
    played_frames(&mut engine);
    engine.end_play().unwrap();
    engine.set_speed_ratio(1.5).unwrap();
    let frames = played_frames(&mut engine) as i64;
    assert!((frames - 6000).abs() <= 2, "got {} frames", frames);
}
