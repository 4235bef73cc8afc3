use std::future::Future;

use async_trait::async_trait;
use chat_provider::{ChatProvider, ChatRequest, FragmentSink, ProviderProfile, StreamError};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{status_error, GatewayError};
use crate::payload::{GatewayChatRequest, Utf8Decoder};

pub const GATEWAY_PROVIDER_ID: &str = "gateway";

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GatewayError::Client)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// `GET /health`; any non-200 answer is reported as unhealthy.
    pub async fn health(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(self.config.health_url())
            .timeout(self.config.health_timeout)
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(GatewayError::Unhealthy(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatProvider for GatewayClient {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: GATEWAY_PROVIDER_ID.to_string(),
            endpoint: Some(self.config.chat_url()),
        }
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
        sink: &mut dyn FragmentSink,
    ) -> Result<(), StreamError> {
        let session_id = request.session_id.clone();
        let body = GatewayChatRequest::from(request);
        let send = self.http.post(self.config.chat_url()).json(&body).send();
        let response = await_or_cancel(send, &cancel)
            .await?
            .map_err(|error| StreamError::Transport(error.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = await_or_cancel(response.text(), &cancel)
                .await?
                .unwrap_or_default();
            debug!(session_id = %session_id, status = status.as_u16(), "gateway rejected chat");
            return Err(status_error(status.as_u16(), &text));
        }

        let mut bytes = response.bytes_stream();
        let mut decoder = Utf8Decoder::default();
        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), &cancel).await? else {
                break;
            };
            let chunk = chunk.map_err(|error| {
                StreamError::Transport(format!("error reading stream: {error}"))
            })?;
            let text = decoder.feed(&chunk);
            if !text.is_empty() {
                sink.push(text).await?;
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            sink.push(tail).await?;
        }
        Ok(())
    }
}

async fn await_or_cancel<F, T>(future: F, cancel: &CancellationToken) -> Result<T, StreamError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(StreamError::Cancelled),
        value = future => Ok(value),
    }
}
