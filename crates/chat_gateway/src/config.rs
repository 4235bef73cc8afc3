use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3001";

/// Transport configuration for gateway requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL without the endpoint path.
    pub base_url: String,
    /// Overall timeout for one chat request, body included.
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            health_timeout: Duration::from_secs(5),
        }
    }
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.trimmed_base())
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.trimmed_base())
    }

    fn trimmed_base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}
