//! Common types for completion requests

use super::LlmError;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Role tag on a message or streamed fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    Human,
    Assistant,
}

impl ChatRole {
    /// Wire name used by OpenAI-compatible endpoints
    pub fn api_name(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::Human => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "system" => Some(ChatRole::System),
            "user" => Some(ChatRole::Human),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

/// One role-tagged message in a completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            stream: true,
        }
    }
}

/// One incremental piece of streamed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub role: ChatRole,
    pub text: String,
}

impl Fragment {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Finite, ordered, non-restartable sequence of fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, LlmError>> + Send>>;
