//! Turn processing: trimming, remote invocation and streamed assembly
//!
//! One call to [`TurnProcessor::process`] produces exactly one assistant
//! turn. Failures never escape; they are folded into the turn's content.

mod phase;
mod processor;
mod trim;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use phase::TurnPhase;
pub use processor::{TurnOutcome, TurnProcessor, ERROR_MARKER};
pub use trim::{TrimPolicy, DEFAULT_TOKEN_BUDGET};

/// Receives progress of a single turn as it is produced
pub trait TurnObserver {
    /// Called after each phase transition
    fn on_phase(&mut self, _phase: TurnPhase) {}

    /// Called with the full accumulated text after each fragment
    fn on_partial(&mut self, text: &str);
}

impl<F: FnMut(&str)> TurnObserver for F {
    fn on_partial(&mut self, text: &str) {
        self(text);
    }
}
