//! Session runtime executor

use super::{ChatSnapshot, SessionError, SessionEvent, SseEvent};
use crate::conversation::{ConversationStore, Turn};
use crate::turn::{TurnObserver, TurnOutcome, TurnPhase, TurnProcessor};
use crate::wellness::{random_followup, Profile};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Forwards turn progress to SSE subscribers
struct BroadcastObserver {
    tx: broadcast::Sender<SseEvent>,
}

impl TurnObserver for BroadcastObserver {
    fn on_phase(&mut self, phase: TurnPhase) {
        let _ = self.tx.send(SseEvent::Phase { phase });
    }

    fn on_partial(&mut self, text: &str) {
        let _ = self.tx.send(SseEvent::Partial {
            text: text.to_string(),
        });
    }
}

/// Owns one thread's conversation and profile and runs its turns
pub struct SessionRuntime {
    thread_id: String,
    conversation: ConversationStore,
    profile: Profile,
    processor: Arc<TurnProcessor>,
    event_rx: mpsc::Receiver<SessionEvent>,
    event_tx: mpsc::Sender<SessionEvent>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    /// Token for the turn currently in flight, if any
    turn_cancel_token: Option<CancellationToken>,
}

impl SessionRuntime {
    pub fn new(
        thread_id: String,
        processor: Arc<TurnProcessor>,
        event_rx: mpsc::Receiver<SessionEvent>,
        event_tx: mpsc::Sender<SessionEvent>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            thread_id,
            conversation: ConversationStore::new(),
            profile: Profile::default(),
            processor,
            event_rx,
            event_tx,
            broadcast_tx,
            turn_cancel_token: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(thread_id = %self.thread_id, "Starting session runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::info!(thread_id = %self.thread_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::UserMessage { text, reply } => {
                let _ = reply.send(self.handle_user_message(text));
            }
            SessionEvent::Regenerate { reply } => {
                let _ = reply.send(self.handle_regenerate());
            }
            SessionEvent::Cancel { reply } => {
                let in_flight = match &self.turn_cancel_token {
                    Some(token) => {
                        tracing::info!(thread_id = %self.thread_id, "Cancelling turn");
                        token.cancel();
                        true
                    }
                    None => false,
                };
                let _ = reply.send(in_flight);
            }
            SessionEvent::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionEvent::GetProfile { reply } => {
                let _ = reply.send(self.profile.clone());
            }
            SessionEvent::SaveProfile { profile, reply } => {
                let result = match profile.validate() {
                    Ok(()) => {
                        self.profile = profile;
                        tracing::info!(thread_id = %self.thread_id, "Profile saved");
                        Ok(self.profile.clone())
                    }
                    Err(e) => Err(SessionError::from(e)),
                };
                let _ = reply.send(result);
            }
            SessionEvent::TurnFinished { outcome } => self.finish_turn(outcome),
        }
    }

    fn is_busy(&self) -> bool {
        self.turn_cancel_token.is_some()
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            thread_id: self.thread_id.clone(),
            turns: self.conversation.all().to_vec(),
            agent_working: self.is_busy(),
        }
    }

    fn handle_user_message(&mut self, text: String) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let turn = Turn::human(text);
        self.conversation.append(turn.clone());
        let _ = self.broadcast_tx.send(SseEvent::Message { turn });
        self.start_turn();
        Ok(())
    }

    fn handle_regenerate(&mut self) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if !self.conversation.has_human_turn() {
            return Err(SessionError::NothingToRegenerate);
        }
        tracing::info!(thread_id = %self.thread_id, "Regenerating last reply");
        self.start_turn();
        Ok(())
    }

    /// Run the processor in the background; the outcome comes back as
    /// `SessionEvent::TurnFinished`
    fn start_turn(&mut self) {
        let cancel_token = CancellationToken::new();
        self.turn_cancel_token = Some(cancel_token.clone());

        let processor = self.processor.clone();
        let history = self.conversation.all().to_vec();
        let event_tx = self.event_tx.clone();
        let mut observer = BroadcastObserver {
            tx: self.broadcast_tx.clone(),
        };

        tokio::spawn(async move {
            let outcome = processor
                .process(&history, &cancel_token, &mut observer)
                .await;
            if event_tx
                .send(SessionEvent::TurnFinished { outcome })
                .await
                .is_err()
            {
                tracing::warn!("Session closed before turn finished");
            }
        });
    }

    fn finish_turn(&mut self, outcome: TurnOutcome) {
        self.turn_cancel_token = None;

        let TurnOutcome {
            turn,
            dropped_placeholder,
            retained_turns,
            failed,
        } = outcome;

        if dropped_placeholder {
            if let Some(stale) = self.conversation.discard_trailing_assistant() {
                tracing::debug!(turn_id = %stale.id(), "Discarded previous reply");
            }
        }
        self.conversation.append(turn.clone());

        tracing::info!(
            thread_id = %self.thread_id,
            retained = retained_turns,
            total = self.conversation.all().len(),
            failed,
            "Turn finalized"
        );

        // Regenerated replies replace the whole client view
        let _ = if dropped_placeholder {
            self.broadcast_tx.send(SseEvent::Init(self.snapshot()))
        } else {
            self.broadcast_tx.send(SseEvent::Message { turn })
        };

        if failed {
            let _ = self.broadcast_tx.send(SseEvent::Error {
                message: "The assistant could not complete its reply".to_string(),
            });
        }
        let followup = (!failed).then(random_followup);
        let _ = self.broadcast_tx.send(SseEvent::AgentDone { followup });
    }
}
