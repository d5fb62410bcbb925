//! HTTP API for the wellness chat

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
    /// The single conversation thread this deployment serves
    pub thread_id: Arc<str>,
}

impl AppState {
    pub fn new(runtime: Arc<RuntimeManager>, thread_id: impl Into<Arc<str>>) -> Self {
        Self {
            runtime,
            thread_id: thread_id.into(),
        }
    }
}
