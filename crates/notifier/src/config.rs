//! Configuration types for the Telegram client.

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for talking to the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org").
    pub base_url: String,
    /// Bot token issued by BotFather.
    pub token: String,
}

impl TelegramConfig {
    /// Create a configuration for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
        }
    }

    /// Point the client at another Bot API server (local server, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the URL of a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

// The token is a credential; keep it out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}
