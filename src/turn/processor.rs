//! Produces one assistant turn from a conversation history

use super::phase::{PhaseSignal, TurnPhase};
use super::trim::TrimPolicy;
use super::TurnObserver;
use crate::conversation::Turn;
use crate::llm::{ChatRole, CompletionRequest, CompletionService, LlmError};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const SYSTEM_PROMPT: &str = "You are a helpful, friendly Health and Wellness assistant. \
Provide accurate and empathetic responses to user queries.";

/// Prefix of every assistant turn produced from a failure
pub const ERROR_MARKER: &str = "❌ Error:";

/// Result of one `process` call. Always carries an assistant turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn: Turn,
    /// The history ended in an assistant turn that was answered in place of
    pub dropped_placeholder: bool,
    /// Number of history turns that made it into the prompt
    pub retained_turns: usize,
    /// The turn content is an error message
    pub failed: bool,
}

pub struct TurnProcessor {
    client: Arc<dyn CompletionService>,
    system_prompt: String,
    policy: TrimPolicy,
    timeout: Option<Duration>,
}

impl TurnProcessor {
    pub fn new(client: Arc<dyn CompletionService>, policy: TrimPolicy) -> Self {
        Self {
            client,
            system_prompt: SYSTEM_PROMPT.to_string(),
            policy,
            timeout: None,
        }
    }

    #[cfg(test)]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(&self) -> TrimPolicy {
        self.policy
    }

    pub fn model_id(&self) -> &str {
        self.client.model_id()
    }

    /// Run one turn exchange over `history`.
    ///
    /// `history` is never modified. Every failure, including cancellation
    /// and the deadline, comes back as an assistant turn starting with
    /// [`ERROR_MARKER`].
    pub async fn process<O>(
        &self,
        history: &[Turn],
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> TurnOutcome
    where
        O: TurnObserver + Send,
    {
        let mut tracker = PhaseTracker::new(observer);
        tracker.advance(PhaseSignal::Start);

        let (history, dropped_placeholder) = match history.split_last() {
            Some((last, rest)) if last.is_assistant() => (rest, true),
            _ => (history, false),
        };
        if dropped_placeholder {
            tracing::debug!("Dropping trailing assistant turn before processing");
        }
        tracker.advance(PhaseSignal::PlaceholderChecked);

        if history.is_empty() {
            tracker.advance(PhaseSignal::Failed);
            return failed_outcome(
                &LlmError::invalid_request("Conversation has no message to answer"),
                dropped_placeholder,
                0,
            );
        }

        let window = self.policy.select(&self.system_prompt, history);
        let retained_turns = window.turns.len();
        tracing::debug!(
            retained = retained_turns,
            total = history.len(),
            cost = window.cost,
            budget = self.policy.budget,
            "Trimmed context"
        );
        if window.is_over_budget(self.policy) {
            tracing::warn!(
                cost = window.cost,
                budget = self.policy.budget,
                "Newest message alone exceeds the token budget"
            );
        }
        let request = CompletionRequest::new(window.to_messages());
        tracker.advance(PhaseSignal::Trimmed);

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(LlmError::cancelled("Request cancelled")),
            result = self.with_deadline(self.exchange(&request, &mut tracker)) => result,
        };

        match result {
            Ok(text) => {
                tracker.advance(PhaseSignal::StreamExhausted);
                tracing::info!(
                    retained = retained_turns,
                    chars = text.chars().count(),
                    "Turn completed"
                );
                TurnOutcome {
                    turn: Turn::assistant(text),
                    dropped_placeholder,
                    retained_turns,
                    failed: false,
                }
            }
            Err(e) => {
                tracing::warn!(
                    phase = ?tracker.phase,
                    kind = ?e.kind,
                    error = %e.message,
                    "Turn failed, answering with error message"
                );
                tracker.advance(PhaseSignal::Failed);
                failed_outcome(&e, dropped_placeholder, retained_turns)
            }
        }
    }

    /// Open the stream and concatenate assistant fragments in arrival order
    async fn exchange<O>(
        &self,
        request: &CompletionRequest,
        tracker: &mut PhaseTracker<'_, O>,
    ) -> Result<String, LlmError>
    where
        O: TurnObserver + Send,
    {
        let mut fragments = self.client.stream(request).await?;
        tracker.advance(PhaseSignal::StreamOpened);

        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if fragment.role != ChatRole::Assistant {
                continue;
            }
            text.push_str(&fragment.text);
            tracker.observer.on_partial(&text);
        }
        Ok(text)
    }

    async fn with_deadline<F>(&self, exchange: F) -> Result<String, LlmError>
    where
        F: Future<Output = Result<String, LlmError>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or_else(|_| {
                    Err(LlmError::timeout(format!(
                        "No complete response within {}ms",
                        limit.as_millis()
                    )))
                }),
            None => exchange.await,
        }
    }
}

fn failed_outcome(
    error: &LlmError,
    dropped_placeholder: bool,
    retained_turns: usize,
) -> TurnOutcome {
    TurnOutcome {
        turn: Turn::assistant(format!("{ERROR_MARKER} {error}")),
        dropped_placeholder,
        retained_turns,
        failed: true,
    }
}

/// Tracks the current phase and reports transitions to the observer
struct PhaseTracker<'a, O> {
    phase: TurnPhase,
    observer: &'a mut O,
}

impl<'a, O: TurnObserver> PhaseTracker<'a, O> {
    fn new(observer: &'a mut O) -> Self {
        Self {
            phase: TurnPhase::Idle,
            observer,
        }
    }

    fn advance(&mut self, signal: PhaseSignal) {
        match self.phase.advance(signal) {
            Ok(next) => {
                tracing::trace!(from = ?self.phase, to = ?next, "Turn phase");
                self.phase = next;
                self.observer.on_phase(next);
            }
            Err(e) => tracing::error!(error = %e, "Turn phase out of sequence"),
        }
    }
}
