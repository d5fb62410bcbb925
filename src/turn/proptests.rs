//! Property-based tests for trimming and streamed assembly
//!
//! - The window is a contiguous suffix of the history
//! - Window cost stays within budget, except the forced single-turn case
//! - The window is maximal: the next older turn would not have fit
//! - Re-trimming a window is a no-op
//! - Finalized content is exactly the concatenation of the fragments

use super::testing::{Recorder, Script, ScriptedCompletion};
use super::trim::cost;
use super::{TrimPolicy, TurnProcessor, ERROR_MARKER};
use crate::conversation::Turn;
use crate::llm::{Fragment, LlmError};
use proptest::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Strategies
// ============================================================================

fn arb_turn() -> impl Strategy<Value = Turn> {
    (any::<bool>(), "[a-zA-Z0-9 .,!?é]{0,120}").prop_map(|(human, text)| {
        if human {
            Turn::human(text)
        } else {
            Turn::assistant(text)
        }
    })
}

fn arb_history() -> impl Strategy<Value = Vec<Turn>> {
    proptest::collection::vec(arb_turn(), 0..16)
}

fn arb_system() -> impl Strategy<Value = String> {
    "[a-zA-Z .]{0,200}"
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn contents(turns: &[Turn]) -> Vec<&str> {
    turns.iter().map(Turn::content).collect()
}

// ============================================================================
// Trimming properties
// ============================================================================

proptest! {
    #[test]
    fn window_is_suffix(
        history in arb_history(),
        system in arb_system(),
        budget in 0usize..300,
    ) {
        let window = TrimPolicy::new(budget).select(&system, &history);
        prop_assert!(window.turns.len() <= history.len());
        let start = history.len() - window.turns.len();
        prop_assert_eq!(contents(window.turns), contents(&history[start..]));
    }

    #[test]
    fn window_cost_is_bounded(
        history in arb_history(),
        system in arb_system(),
        budget in 0usize..300,
    ) {
        let policy = TrimPolicy::new(budget);
        let window = policy.select(&system, &history);

        let recomputed =
            cost(&system) + window.turns.iter().map(|t| cost(t.content())).sum::<usize>();
        prop_assert_eq!(window.cost, recomputed);

        if window.is_over_budget(policy) {
            if let Some(last) = history.last() {
                // Only the forced case may exceed: exactly the most recent turn
                prop_assert_eq!(window.turns.len(), 1);
                prop_assert_eq!(window.turns[0].id(), last.id());
            } else {
                // Oversized system instruction over an empty history
                prop_assert!(window.turns.is_empty());
            }
        }
    }

    #[test]
    fn window_is_never_empty_when_history_is_not(
        history in arb_history(),
        system in arb_system(),
        budget in 0usize..300,
    ) {
        let window = TrimPolicy::new(budget).select(&system, &history);
        prop_assert_eq!(window.turns.is_empty(), history.is_empty());
    }

    #[test]
    fn window_is_maximal(
        history in arb_history(),
        system in arb_system(),
        budget in 0usize..300,
    ) {
        let policy = TrimPolicy::new(budget);
        let window = policy.select(&system, &history);
        if window.turns.len() < history.len() && !window.is_over_budget(policy) {
            let next_older = &history[history.len() - window.turns.len() - 1];
            prop_assert!(window.cost + cost(next_older.content()) > budget);
        }
    }

    #[test]
    fn trimming_is_idempotent(
        history in arb_history(),
        system in arb_system(),
        budget in 0usize..300,
    ) {
        let policy = TrimPolicy::new(budget);
        let once = policy.select(&system, &history);
        let twice = policy.select(&system, once.turns);
        prop_assert_eq!(contents(once.turns), contents(twice.turns));
        prop_assert_eq!(once.cost, twice.cost);
    }
}

// ============================================================================
// Processor properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn finalized_content_is_concatenation(
        fragments in proptest::collection::vec("[a-zA-Z0-9 \n]{0,20}", 0..24),
    ) {
        let client = Arc::new(ScriptedCompletion::new("scripted"));
        client.queue(Script::fragments(fragments.clone()));
        let processor = TurnProcessor::new(client, TrimPolicy::default());

        let mut recorder = Recorder::default();
        let history = [Turn::human("hi")];
        let outcome =
            block_on(processor.process(&history, &CancellationToken::new(), &mut recorder));

        let expected: String = fragments.concat();
        prop_assert!(!outcome.failed);
        prop_assert_eq!(outcome.turn.content(), expected.as_str());
        prop_assert_eq!(recorder.partials.len(), fragments.len());
        if let Some(last) = recorder.partials.last() {
            prop_assert_eq!(last.as_str(), expected.as_str());
        }
        // Every partial extends the previous one
        for pair in recorder.partials.windows(2) {
            prop_assert!(pair[1].starts_with(pair[0].as_str()));
        }
    }

    #[test]
    fn failures_always_finalize_with_marker(
        prefix in proptest::collection::vec("[a-z]{1,10}", 0..5),
        fail_on_open in any::<bool>(),
    ) {
        let client = Arc::new(ScriptedCompletion::new("scripted"));
        if fail_on_open {
            client.queue(Script::OpenError(LlmError::server_error("boom")));
        } else {
            let mut items: Vec<_> =
                prefix.iter().map(|t| Ok(Fragment::assistant(t.clone()))).collect();
            items.push(Err(LlmError::network("boom")));
            client.queue(Script::Fragments(items));
        }
        let processor = TurnProcessor::new(client, TrimPolicy::default());

        let history = [Turn::human("hi")];
        let mut ignore = |_: &str| {};
        let outcome =
            block_on(processor.process(&history, &CancellationToken::new(), &mut ignore));
        prop_assert!(outcome.failed);
        prop_assert!(outcome.turn.is_assistant());
        prop_assert!(outcome.turn.content().starts_with(ERROR_MARKER));
    }

    #[test]
    fn prompt_matches_window_of_effective_history(
        history in arb_history(),
        budget in 0usize..300,
    ) {
        let client = Arc::new(ScriptedCompletion::new("scripted"));
        client.queue(Script::fragments(["ok"]));
        let policy = TrimPolicy::new(budget);
        let processor = TurnProcessor::new(client.clone(), policy).with_system_prompt("sys");

        let mut ignore = |_: &str| {};
        let outcome =
            block_on(processor.process(&history, &CancellationToken::new(), &mut ignore));

        let ends_in_assistant = history.last().is_some_and(Turn::is_assistant);
        prop_assert_eq!(outcome.dropped_placeholder, ends_in_assistant);

        let effective = if ends_in_assistant {
            &history[..history.len() - 1]
        } else {
            &history[..]
        };
        let requests = client.recorded_requests();
        if effective.is_empty() {
            prop_assert!(requests.is_empty());
            prop_assert!(outcome.failed);
        } else {
            let expected = policy.select("sys", effective).to_messages();
            prop_assert_eq!(&requests[0].messages, &expected);
        }
    }
}
