//! Transport state machine.

use crate::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Recording,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportRequest {
    BeginRecord,
    EndRecord,
    BeginPlay,
    EndPlay,
}

/// `(request, allowed from, result)`. Anything not listed is rejected.
pub const TRANSITIONS: [(TransportRequest, Phase, Phase); 4] = [
    (TransportRequest::BeginRecord, Phase::Idle, Phase::Recording),
    (TransportRequest::EndRecord, Phase::Recording, Phase::Idle),
    (TransportRequest::BeginPlay, Phase::Idle, Phase::Playing),
    (TransportRequest::EndPlay, Phase::Playing, Phase::Idle),
];

impl Phase {
    /// Phase reached by applying `request`, or `InvalidTransition`.
    pub fn transition(self, request: TransportRequest) -> Result<Phase> {
        TRANSITIONS
            .iter()
            .find(|(req, from, _)| *req == request && *from == self)
            .map(|(_, _, to)| *to)
            .ok_or(Error::InvalidTransition {
                request,
                phase: self,
            })
    }

    pub fn is_idle(self) -> bool {
        self == Phase::Idle
    }
}

impl TransportRequest {
    pub const ALL: [TransportRequest; 4] = [
        TransportRequest::BeginRecord,
        TransportRequest::EndRecord,
        TransportRequest::BeginPlay,
        TransportRequest::EndPlay,
    ];
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        match phase {
            Phase::Idle => 0,
            Phase::Recording => 1,
            Phase::Playing => 2,
        }
    }
}

impl From<u8> for Phase {
    fn from(value: u8) -> Phase {
        match value {
            1 => Phase::Recording,
            2 => Phase::Playing,
            _ => Phase::Idle,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Recording => "recording",
            Phase::Playing => "playing",
        })
    }
}

impl fmt::Display for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportRequest::BeginRecord => "begin-record",
            TransportRequest::EndRecord => "end-record",
            TransportRequest::BeginPlay => "begin-play",
            TransportRequest::EndPlay => "end-play",
        })
    }
}
