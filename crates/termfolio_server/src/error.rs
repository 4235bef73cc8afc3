use std::net::SocketAddr;

use chat_gateway::GatewayError;
use portfolio_content::ContentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error for {peer}: {source}")]
    Transport {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to load portfolio content: {0}")]
    Content(#[from] ContentError),

    #[error("failed to create AI gateway client: {0}")]
    Gateway(#[from] GatewayError),
}

impl ServerError {
    #[must_use]
    pub fn transport(peer: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            peer: peer.into(),
            source,
        }
    }

    #[must_use]
    pub fn bind(address: &SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.to_string(),
            source,
        }
    }
}
