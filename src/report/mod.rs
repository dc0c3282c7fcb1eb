//! Bug report submission: payload types and the board HTTP client.

pub mod client;
pub mod types;

pub use client::{BugBoardClient, ReportSink};
pub use types::{BugReport, CreatedBug, ReportPayload, SubmittedReport};
