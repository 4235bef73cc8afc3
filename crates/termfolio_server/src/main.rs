//! Terminal portfolio server binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve ./content and stream chat from a local gateway
//! termfolio-server --bind 127.0.0.1:2222
//!
//! # Offline, with the scripted assistant
//! termfolio-server --mock-provider --content-path ./content
//! ```

use std::sync::Arc;

use chat_gateway::{GatewayClient, GatewayConfig};
use chat_provider::ChatProvider;
use chat_provider_mock::MockChatProvider;
use clap::Parser;
use portfolio_content::ContentLoader;
use termfolio_server::{logging, Args, EnvConfig, Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let config = ServerConfig::resolve(&args, &EnvConfig::from_env())?;
    tracing::info!(
        bind = %config.bind,
        content = %config.content_path.display(),
        max_sessions = config.max_sessions_per_address,
        idle_secs = config.idle_timeout.as_secs(),
        "termfolio server starting"
    );

    let portfolio = Arc::new(ContentLoader::new(&config.content_path).load_all()?);

    let provider: Arc<dyn ChatProvider> = if config.mock_provider {
        tracing::warn!("using the scripted mock assistant");
        Arc::new(MockChatProvider::default())
    } else {
        let client = Arc::new(GatewayClient::new(GatewayConfig::new(&config.gateway_url))?);
        let checker = Arc::clone(&client);
        tokio::spawn(async move {
            match checker.health().await {
                Ok(()) => tracing::info!(url = %checker.config().base_url, "AI gateway healthy"),
                Err(error) => tracing::warn!(
                    url = %checker.config().base_url,
                    error = %error,
                    "AI gateway health check failed; chat may be unavailable"
                ),
            }
        });
        client
    };

    let server = Server::bind(&config, portfolio, Some(provider)).await?;
    tracing::info!("listening on {}", server.local_addr()?);

    server.run().await?;
    tracing::info!("termfolio server stopped");
    Ok(())
}
