//! Server configuration: CLI flags over environment over defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chat_gateway::DEFAULT_GATEWAY_URL;
use clap::Parser;

use crate::admission::DEFAULT_MAX_PER_ADDRESS;
use crate::error::ServerError;

pub const DEFAULT_BIND: &str = "0.0.0.0:2222";
pub const DEFAULT_CONTENT_PATH: &str = "./content";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Terminal portfolio session server
#[derive(Parser, Debug, Default)]
#[command(name = "termfolio-server")]
#[command(about = "Serves the terminal portfolio and streaming AI chat")]
#[command(version)]
pub struct Args {
    /// Address to bind to [default: 0.0.0.0:2222]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory holding resume.json, projects.json and bio.md
    #[arg(long)]
    pub content_path: Option<PathBuf>,

    /// Base URL of the AI gateway [default: http://localhost:3001]
    #[arg(long)]
    pub gateway_url: Option<String>,

    /// Concurrent sessions allowed per client address [default: 5]
    #[arg(long)]
    pub max_sessions_per_address: Option<usize>,

    /// Disconnect after this many seconds without input [default: 600]
    #[arg(long)]
    pub idle_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Use the offline scripted assistant instead of the gateway
    #[arg(long)]
    pub mock_provider: bool,
}

/// Values read from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub bind: Option<String>,
    pub content_path: Option<String>,
    pub gateway_url: Option<String>,
    pub max_sessions_per_address: Option<usize>,
    pub idle_timeout_secs: Option<u64>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_string_opt("TERMFOLIO_BIND"),
            content_path: env_string_opt("CONTENT_PATH"),
            gateway_url: env_string_opt("AI_GATEWAY_URL"),
            max_sessions_per_address: env_parse_opt("TERMFOLIO_MAX_SESSIONS"),
            idle_timeout_secs: env_parse_opt("TERMFOLIO_IDLE_TIMEOUT_SECS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub content_path: PathBuf,
    pub gateway_url: String,
    pub max_sessions_per_address: usize,
    pub idle_timeout: Duration,
    pub mock_provider: bool,
}

impl ServerConfig {
    pub fn resolve(args: &Args, env: &EnvConfig) -> Result<Self, ServerError> {
        let bind_text = args
            .bind
            .clone()
            .or_else(|| env.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = SocketAddr::from_str(bind_text.trim())
            .map_err(|error| ServerError::Config(format!("bind address {bind_text:?}: {error}")))?;

        let max_sessions_per_address = args
            .max_sessions_per_address
            .or(env.max_sessions_per_address)
            .unwrap_or(DEFAULT_MAX_PER_ADDRESS);
        if max_sessions_per_address == 0 {
            return Err(ServerError::Config(
                "max sessions per address must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind,
            content_path: args
                .content_path
                .clone()
                .or_else(|| env.content_path.clone().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_PATH)),
            gateway_url: args
                .gateway_url
                .clone()
                .or_else(|| env.gateway_url.clone())
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            max_sessions_per_address,
            idle_timeout: Duration::from_secs(
                args.idle_timeout_secs
                    .or(env.idle_timeout_secs)
                    .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS),
            ),
            mock_provider: args.mock_provider,
        })
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_parse_opt<T: FromStr>(key: &str) -> Option<T> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}
