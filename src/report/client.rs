//! HTTP client for the BugBoard report endpoint.

use async_trait::async_trait;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::ReportError;

use super::types::{BugReport, CreatedBug, ReportPayload, SubmittedReport};

/// Anything that can accept a bug report.
///
/// The detector submits through this seam; [`BugBoardClient`] is the
/// production implementation.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: &BugReport) -> Result<SubmittedReport, ReportError>;
}

/// Client for the hosted BugBoard API.
pub struct BugBoardClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl BugBoardClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn report_endpoint(&self) -> String {
        format!("{}/bugs", self.config.api_url.trim_end_matches('/'))
    }

    /// Human-viewable URL for a filed bug.
    ///
    /// The board serves pages on the site root, so a trailing `/api` segment
    /// is stripped from the configured endpoint before templating.
    fn bug_url(&self, id: &str) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        let site = base.strip_suffix("/api").unwrap_or(base);
        format!("{site}/bugs/{id}")
    }
}

#[async_trait]
impl ReportSink for BugBoardClient {
    async fn submit(&self, report: &BugReport) -> Result<SubmittedReport, ReportError> {
        let url = self.report_endpoint();
        let payload = ReportPayload::new(&self.config.agent_name, report);

        debug!(url = %url, agent = %self.config.agent_name, "Submitting bug report");

        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|source| ReportError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedBug = resp
            .json()
            .await
            .map_err(|source| ReportError::InvalidResponse { source })?;

        Ok(SubmittedReport {
            url: self.bug_url(&created.id),
            id: created.id,
        })
    }
}
