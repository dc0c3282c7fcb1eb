//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `report` | `Report`         |
//! | `watch`  | `Watch`          |

pub mod report;
pub mod watch;

pub use report::cmd_report;
pub use watch::cmd_watch;

use anyhow::{Result, anyhow};

use bugboard::ClientConfig;

/// Environment variable naming the reporting agent.
pub const AGENT_NAME_ENV: &str = "BUGBOARD_AGENT";

/// Resolve the client configuration from CLI flags and the environment.
pub fn resolve_config(agent_name: Option<&str>, api_url: Option<&str>) -> Result<ClientConfig> {
    let agent_name = match agent_name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => std::env::var(AGENT_NAME_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                anyhow!("No agent name configured. Pass --agent-name or set {AGENT_NAME_ENV}")
            })?,
    };

    let mut config = ClientConfig::new(agent_name);
    if let Some(url) = api_url {
        if !url.is_empty() {
            config = config.with_api_url(url);
        }
    }
    Ok(config)
}
