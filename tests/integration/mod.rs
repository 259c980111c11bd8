//! Integration test modules for looptap
//!
//! - engine: builder, events, render view, device listing
//! - transport: phase gating and speed ratio
//! - capture: recording from the loopback device
//! - playback: stretched playback on the default output
//! - stretch: offline time-stretch through the engine

pub mod capture;
pub mod engine;
pub mod stretch;
pub mod transport;
