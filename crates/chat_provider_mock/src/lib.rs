//! Deterministic scripted implementation of the `chat_provider` contract.
//!
//! No network access. Used by server tests and by `--mock-provider` runs.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chat_provider::{ChatProvider, ChatRequest, FragmentSink, ProviderProfile, StreamError};
use tokio_util::sync::CancellationToken;

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// What happens once the scripted chunks have been emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    Finish,
    Fail(StreamError),
    /// Keep the stream open until the caller cancels it.
    BlockUntilCancelled,
}

/// Scripted provider that replays its chunks token by token.
#[derive(Debug)]
pub struct MockChatProvider {
    chunks: Vec<String>,
    start_delay: Duration,
    token_delay: Duration,
    outcome: MockOutcome,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    const START_DELAY_MS: u64 = 200;
    const TOKEN_DELAY_MS: u64 = 30;

    /// Creates a provider with caller-provided chunks and no artificial delay.
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            start_delay: Duration::ZERO,
            token_delay: Duration::ZERO,
            outcome: MockOutcome::Finish,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Chunks from plain string slices, convenient for tests.
    #[must_use]
    pub fn from_chunks(chunks: &[&str]) -> Self {
        Self::new(chunks.iter().map(|chunk| (*chunk).to_string()).collect())
    }

    #[must_use]
    pub fn with_delays(mut self, start_delay: Duration, token_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self.token_delay = token_delay;
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: MockOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> Result<(), StreamError> {
        if delay.is_zero() {
            return if cancel.is_cancelled() {
                Err(StreamError::Cancelled)
            } else {
                Ok(())
            };
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(StreamError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

impl Default for MockChatProvider {
    fn default() -> Self {
        Self::new(vec![
            "## Hey there\n".to_string(),
            "\n".to_string(),
            "This is the **offline** assistant. It streams a fixed reply so the session can be exercised without a gateway.\n".to_string(),
            "\n".to_string(),
            "- Try `/projects` to browse work\n".to_string(),
            "- Try `/resume` for the CV\n".to_string(),
            "\n".to_string(),
            "```rust\n".to_string(),
            "fn main() {\n".to_string(),
            "    println!(\"hello from the mock\");\n".to_string(),
            "}\n".to_string(),
            "```\n".to_string(),
            "\n".to_string(),
            "| Key | Action |\n".to_string(),
            "| --- | --- |\n".to_string(),
            "| alt+h | help |\n".to_string(),
            "| alt+q | quit |\n".to_string(),
        ])
        .with_delays(
            Duration::from_millis(Self::START_DELAY_MS),
            Duration::from_millis(Self::TOKEN_DELAY_MS),
        )
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            endpoint: None,
        }
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        sink: &mut dyn FragmentSink,
    ) -> Result<(), StreamError> {
        lock_unpoisoned(&self.requests).push(request);

        self.pause(self.start_delay, &cancel).await?;

        for chunk in &self.chunks {
            let mut pending_token = String::new();
            for ch in chunk.chars() {
                pending_token.push(ch);
                if matches!(ch, ' ' | '\n') {
                    self.pause(Duration::ZERO, &cancel).await?;
                    sink.push(std::mem::take(&mut pending_token)).await?;
                    self.pause(self.token_delay, &cancel).await?;
                }
            }

            if !pending_token.is_empty() {
                self.pause(Duration::ZERO, &cancel).await?;
                sink.push(pending_token).await?;
                self.pause(self.token_delay, &cancel).await?;
            }
        }

        match &self.outcome {
            MockOutcome::Finish => Ok(()),
            MockOutcome::Fail(error) => Err(error.clone()),
            MockOutcome::BlockUntilCancelled => {
                cancel.cancelled().await;
                Err(StreamError::Cancelled)
            }
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
