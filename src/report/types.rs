//! Report types shared by the detector and the HTTP client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bug report as callers describe it.
///
/// Produced either by a caller invoking manual reporting or by the detector
/// when it escalates. The wire form adds the agent identity and a timestamp
/// at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugReport {
    /// What the agent was asked to do.
    pub input: String,
    /// Log output supporting the report.
    pub logs: String,
    /// Error message, if any.
    #[serde(default)]
    pub error: Option<String>,
}

impl BugReport {
    pub fn new(input: impl Into<String>, logs: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            logs: logs.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// The JSON body POSTed to the report endpoint.
///
/// The board expects camelCase keys and an ISO-8601 timestamp.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub agent_name: String,
    pub input: String,
    pub logs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ReportPayload {
    pub fn new(agent_name: &str, report: &BugReport) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            input: report.input.clone(),
            logs: report.logs.clone(),
            error: report.error.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Response from the report endpoint (subset of fields we care about).
#[derive(Debug, Deserialize)]
pub struct CreatedBug {
    pub id: String,
}

/// A successfully filed report: the board's identifier plus a viewable URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedReport {
    pub id: String,
    pub url: String,
}
