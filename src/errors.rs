//! Typed errors for report submission.
//!
//! Only the explicit, caller-initiated report path surfaces these; the
//! detector's automatic escalation logs and discards them.

use thiserror::Error;

/// Errors from submitting a bug report to the board.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to send bug report to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Bug board rejected the report with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to parse bug board response: {source}")]
    InvalidResponse {
        #[source]
        source: reqwest::Error,
    },
}
