//! HTTP client for the AI gateway.
//!
//! `POST {base}/chat` takes `{message, sessionId, history}` and answers with a
//! plain-text body that is forwarded to the caller as it arrives.
//! `GET {base}/health` reports availability.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;

pub use client::GatewayClient;
pub use config::{GatewayConfig, DEFAULT_GATEWAY_URL};
pub use error::GatewayError;
pub use payload::GatewayChatRequest;
