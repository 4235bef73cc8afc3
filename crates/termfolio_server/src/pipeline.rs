//! Streams one chat reply from a provider into a session.
//!
//! One worker task per request feeds a bounded fragment queue. The terminal
//! outcome travels on a separate single-slot channel and is read only after
//! the queue has closed, so it can never overtake a fragment.

use std::sync::Arc;

use async_trait::async_trait;
use chat_provider::{ChatMessage, ChatProvider, ChatRequest, FragmentSink, StreamError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
/// Prior messages handed to the provider with each request.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    /// Always the last event. `None` means the reply completed normally.
    Finished(Option<StreamError>),
}

#[derive(Clone)]
pub struct StreamPipeline {
    provider: Arc<dyn ChatProvider>,
    capacity: usize,
}

impl StreamPipeline {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self::with_capacity(provider, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(provider: Arc<dyn ChatProvider>, capacity: usize) -> Self {
        Self {
            provider,
            capacity: capacity.max(1),
        }
    }

    pub fn provider_id(&self) -> String {
        self.provider.profile().provider_id
    }

    /// Starts streaming the reply to `message`. Must be called from within a
    /// tokio runtime.
    pub fn send(&self, session_id: &str, message: &str, history: &[ChatMessage]) -> ActiveStream {
        let bounded = history[history.len().saturating_sub(HISTORY_LIMIT)..].to_vec();
        let request = ChatRequest {
            session_id: session_id.to_string(),
            message: message.to_string(),
            history: bounded,
        };

        let (fragment_tx, fragment_rx) = mpsc::channel(self.capacity);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let provider = Arc::clone(&self.provider);
        let worker_cancel = cancel.clone();
        let session = session_id.to_string();

        info!(
            session_id = %session,
            provider = %provider.profile().provider_id,
            history = request.history.len(),
            "stream started"
        );

        tokio::spawn(async move {
            let mut sink = QueueSink {
                queue: fragment_tx,
                cancel: worker_cancel.clone(),
            };
            let result = provider
                .stream_chat(request, worker_cancel.clone(), &mut sink)
                .await;
            let outcome = match result {
                Ok(()) if worker_cancel.is_cancelled() => Some(StreamError::Cancelled),
                Ok(()) => None,
                Err(error) => Some(error),
            };
            match &outcome {
                None => debug!(session_id = %session, "stream finished"),
                Some(error) if error.is_cancelled() => {
                    debug!(session_id = %session, "stream cancelled")
                }
                Some(error) => warn!(session_id = %session, error = %error, "stream failed"),
            }
            let _ = outcome_tx.send(outcome);
        });

        ActiveStream {
            fragments: fragment_rx,
            outcome: Some(outcome_rx),
            cancel,
        }
    }
}

struct QueueSink {
    queue: mpsc::Sender<String>,
    cancel: CancellationToken,
}

#[async_trait]
impl FragmentSink for QueueSink {
    async fn push(&mut self, fragment: String) -> Result<(), StreamError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamError::Cancelled),
            sent = self.queue.send(fragment) => sent.map_err(|_| StreamError::Cancelled),
        }
    }
}

/// Receiving end of one in-flight reply. Dropping it cancels the worker.
#[derive(Debug)]
pub struct ActiveStream {
    fragments: mpsc::Receiver<String>,
    outcome: Option<oneshot::Receiver<Option<StreamError>>>,
    cancel: CancellationToken,
}

impl ActiveStream {
    /// Next fragment in emission order, then exactly one
    /// [`StreamEvent::Finished`], then `None` forever. Cancel safe.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if let Some(fragment) = self.fragments.recv().await {
            return Some(StreamEvent::Fragment(fragment));
        }
        let receiver = self.outcome.as_mut()?;
        let outcome = match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Some(StreamError::Panicked),
        };
        self.outcome = None;
        Some(StreamEvent::Finished(outcome))
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops the worker and returns the fragments that were already queued.
    /// Nothing is delivered afterwards.
    pub fn cancel_and_drain(&mut self) -> Vec<String> {
        self.cancel.cancel();
        self.fragments.close();
        let mut drained = Vec::new();
        while let Ok(fragment) = self.fragments.try_recv() {
            drained.push(fragment);
        }
        self.outcome = None;
        drained
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
