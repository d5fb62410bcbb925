//! Per-thread session runtimes
//!
//! Each thread id gets one background task that owns its conversation and
//! profile. Callers talk to it through an event channel and receive replies
//! over oneshot channels; streaming progress fans out on a broadcast channel.

mod executor;

pub use executor::SessionRuntime;

use crate::conversation::Turn;
use crate::turn::{TurnOutcome, TurnPhase, TurnProcessor};
use crate::wellness::{Profile, ProfileError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("A reply is already being generated")]
    Busy,
    #[error("Message text must not be empty")]
    EmptyMessage,
    #[error("Nothing to regenerate: the conversation has no user message yet")]
    NothingToRegenerate,
    #[error("Session {0} has stopped")]
    Stopped(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Point-in-time view of a thread
#[derive(Debug, Clone, Serialize)]
pub struct ChatSnapshot {
    pub thread_id: String,
    pub turns: Vec<Turn>,
    pub agent_working: bool,
}

/// Requests handled by a session task
#[derive(Debug)]
pub enum SessionEvent {
    UserMessage {
        text: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Regenerate {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Replies whether a turn was in flight
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<ChatSnapshot>,
    },
    GetProfile {
        reply: oneshot::Sender<Profile>,
    },
    SaveProfile {
        profile: Profile,
        reply: oneshot::Sender<Result<Profile, SessionError>>,
    },
    /// Posted by the turn task when the processor returns
    TurnFinished { outcome: TurnOutcome },
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init(ChatSnapshot),
    Phase { phase: TurnPhase },
    /// Accumulated assistant text so far
    Partial { text: String },
    Message { turn: Turn },
    AgentDone { followup: Option<&'static str> },
    Error { message: String },
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<SessionEvent>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
}

/// Manager for all session runtimes
pub struct RuntimeManager {
    processor: Arc<TurnProcessor>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl RuntimeManager {
    pub fn new(processor: Arc<TurnProcessor>) -> Self {
        Self {
            processor,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn processor(&self) -> &TurnProcessor {
        &self.processor
    }

    /// Get or create the runtime for a thread
    pub async fn get_or_create(&self, thread_id: &str) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(thread_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have won the race between the two locks
        if let Some(handle) = sessions.get(thread_id) {
            return handle.clone();
        }

        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(256);

        let runtime = SessionRuntime::new(
            thread_id.to_string(),
            self.processor.clone(),
            event_rx,
            event_tx.clone(),
            broadcast_tx.clone(),
        );

        let id = thread_id.to_string();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(thread_id = %id, "Session runtime finished");
        });

        let handle = SessionHandle {
            event_tx,
            broadcast_tx,
        };
        sessions.insert(thread_id.to_string(), handle.clone());
        handle
    }

    /// Send a request and wait for the session's reply
    async fn request<T>(
        &self,
        thread_id: &str,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionEvent,
    ) -> Result<T, SessionError> {
        let handle = self.get_or_create(thread_id).await;
        let (reply, rx) = oneshot::channel();
        let stopped = || SessionError::Stopped(thread_id.to_string());
        handle
            .event_tx
            .send(make(reply))
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }

    pub async fn send_message(&self, thread_id: &str, text: String) -> Result<(), SessionError> {
        self.request(thread_id, |reply| SessionEvent::UserMessage { text, reply })
            .await?
    }

    pub async fn regenerate(&self, thread_id: &str) -> Result<(), SessionError> {
        self.request(thread_id, |reply| SessionEvent::Regenerate { reply })
            .await?
    }

    pub async fn cancel(&self, thread_id: &str) -> Result<bool, SessionError> {
        self.request(thread_id, |reply| SessionEvent::Cancel { reply })
            .await
    }

    pub async fn snapshot(&self, thread_id: &str) -> Result<ChatSnapshot, SessionError> {
        self.request(thread_id, |reply| SessionEvent::Snapshot { reply })
            .await
    }

    pub async fn profile(&self, thread_id: &str) -> Result<Profile, SessionError> {
        self.request(thread_id, |reply| SessionEvent::GetProfile { reply })
            .await
    }

    pub async fn save_profile(
        &self,
        thread_id: &str,
        profile: Profile,
    ) -> Result<Profile, SessionError> {
        self.request(thread_id, |reply| SessionEvent::SaveProfile { profile, reply })
            .await?
    }

    /// Subscribe to a thread's updates, returning the snapshot to start from
    pub async fn subscribe(
        &self,
        thread_id: &str,
    ) -> Result<(ChatSnapshot, broadcast::Receiver<SseEvent>), SessionError> {
        let handle = self.get_or_create(thread_id).await;
        // Subscribe before the snapshot so nothing falls between them
        let rx = handle.broadcast_tx.subscribe();
        let snapshot = self.snapshot(thread_id).await?;
        Ok((snapshot, rx))
    }
}
