use std::time::Duration;

/// Production BugBoard API endpoint, used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://bugboard.ai/api";

/// Environment variable overriding the API endpoint.
pub const API_URL_ENV: &str = "BUGBOARD_API_URL";

/// Default inactivity window after which an agent counts as hung (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300_000);

/// Configuration for a BugBoard client.
///
/// `agent_name` identifies the reporting entity and is a precondition the
/// caller must satisfy; the client does not validate it. The API URL falls
/// back to `BUGBOARD_API_URL`, then to the production endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub agent_name: String,
    pub api_url: String,
    /// Inactivity window for the stuck-agent detector.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            api_url: resolve_api_url(None),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the API endpoint. Takes priority over the environment.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Override the detector inactivity window.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn resolve_api_url(direct: Option<&str>) -> String {
    if let Some(url) = direct {
        if !url.is_empty() {
            return url.to_string();
        }
    }
    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.is_empty() {
            return url;
        }
    }
    DEFAULT_API_URL.to_string()
}
