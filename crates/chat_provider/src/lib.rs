//! Provider-neutral contract for streaming one chat reply.
//!
//! This crate defines the conversation types and the streaming call shape
//! only. Transport, wire formats and session orchestration live elsewhere.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Author of one conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One finalized conversation message. Never mutated once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Input for one streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    /// Prior messages, oldest first. Does not include `message`.
    pub history: Vec<ChatMessage>,
}

/// Immutable metadata describing a chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub endpoint: Option<String>,
}

/// Terminal failure of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("rate limit exceeded - please wait before sending more messages")]
    RateLimited,
    #[error("AI gateway error (status {status}): {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("stream cancelled")]
    Cancelled,
    #[error("stream worker panicked")]
    Panicked,
}

impl StreamError {
    /// True for errors caused by the caller asking the stream to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Receives fragments in emission order.
///
/// `push` may suspend when the consumer is slow. An error means the consumer
/// is gone or cancelled, and the provider should stop producing.
#[async_trait]
pub trait FragmentSink: Send {
    async fn push(&mut self, fragment: String) -> Result<(), StreamError>;
}

#[async_trait]
impl FragmentSink for Vec<String> {
    async fn push(&mut self, fragment: String) -> Result<(), StreamError> {
        Vec::push(self, fragment);
        Ok(())
    }
}

/// Provider interface for streaming one chat reply.
#[async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Streams the reply to `request` into `sink`, fragment by fragment.
    ///
    /// Implementations must observe `cancel` at every suspension point and
    /// return [`StreamError::Cancelled`] once it fires.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        sink: &mut dyn FragmentSink,
    ) -> Result<(), StreamError>;
}
