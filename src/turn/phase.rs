//! Per-turn state machine
//!
//! `Idle → PlaceholderCheck → Trimming → Invoking → Streaming → Finalized`,
//! with failure edges straight to `Finalized`. The transition function is
//! pure so the processor's sequencing can be checked in isolation.

use serde::Serialize;
use thiserror::Error;

/// Phase of a single turn exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    PlaceholderCheck,
    Trimming,
    Invoking,
    Streaming,
    Finalized,
}

/// Signals that drive phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    Start,
    PlaceholderChecked,
    Trimmed,
    StreamOpened,
    StreamExhausted,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("Invalid turn transition: {signal:?} in {phase:?}")]
    InvalidTransition {
        phase: TurnPhase,
        signal: PhaseSignal,
    },
}

impl TurnPhase {
    /// Pure transition function
    pub fn advance(self, signal: PhaseSignal) -> Result<TurnPhase, PhaseError> {
        use PhaseSignal as S;
        use TurnPhase as P;

        match (self, signal) {
            (P::Idle, S::Start) => Ok(P::PlaceholderCheck),
            (P::PlaceholderCheck, S::PlaceholderChecked) => Ok(P::Trimming),
            (P::Trimming, S::Trimmed) => Ok(P::Invoking),
            (P::Invoking, S::StreamOpened) => Ok(P::Streaming),
            (P::Streaming, S::StreamExhausted) => Ok(P::Finalized),
            // Nothing to answer is detected while trimming
            (P::Trimming | P::Invoking | P::Streaming, S::Failed) => Ok(P::Finalized),
            (phase, signal) => Err(PhaseError::InvalidTransition { phase, signal }),
        }
    }
}
