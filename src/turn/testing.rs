//! Mock completion service for testing
//!
//! Lets processor and runtime tests script exactly what the remote model
//! streams back without any network I/O.

use super::{TurnObserver, TurnPhase};
use crate::llm::{CompletionRequest, CompletionService, Fragment, FragmentStream, LlmError};
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// What the next `stream` call should do
pub enum Script {
    /// Open successfully and yield these items in order
    Fragments(Vec<Result<Fragment, LlmError>>),
    /// Fail before any fragment is produced
    OpenError(LlmError),
    /// Yield these fragments, then never finish
    Stalled(Vec<Fragment>),
}

impl Script {
    pub fn fragments<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Script::Fragments(
            texts
                .into_iter()
                .map(|text| Ok(Fragment::assistant(text)))
                .collect(),
        )
    }
}

/// Mock completion service that plays back queued scripts
pub struct ScriptedCompletion {
    scripts: Mutex<VecDeque<Script>>,
    model_id: String,
    requests: Mutex<Vec<CompletionRequest>>,
    /// Notified each time a stream is opened (for test synchronization)
    pub stream_opened: Arc<Notify>,
}

impl ScriptedCompletion {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
            stream_opened: Arc::new(Notify::new()),
        }
    }

    pub fn queue(&self, script: Script) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.scripts.lock().unwrap().pop_front();
        self.stream_opened.notify_one();

        match script {
            Some(Script::Fragments(items)) => Ok(Box::pin(stream::iter(items))),
            Some(Script::OpenError(e)) => Err(e),
            Some(Script::Stalled(fragments)) => Ok(Box::pin(
                stream::iter(fragments.into_iter().map(Ok)).chain(stream::pending()),
            )),
            None => Err(LlmError::network("No mock response queued")),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Observer that records everything it is told
#[derive(Debug, Default)]
pub struct Recorder {
    pub phases: Vec<TurnPhase>,
    pub partials: Vec<String>,
}

impl TurnObserver for Recorder {
    fn on_phase(&mut self, phase: TurnPhase) {
        self.phases.push(phase);
    }

    fn on_partial(&mut self, text: &str) {
        self.partials.push(text.to_string());
    }
}
