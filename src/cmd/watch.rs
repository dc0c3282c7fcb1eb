//! Watch mode: feed agent output from stdin into the stuck-agent detector.

use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use bugboard::{ClientConfig, StuckAgentDetector};

/// Read agent output line by line until EOF, tracking each line and counting
/// lines that match `failure_pattern` as build failures. Escalation happens
/// inside the detector; this loop never blocks on a report submission.
pub async fn cmd_watch(
    config: ClientConfig,
    failure_pattern: &str,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let pattern = Regex::new(failure_pattern)
        .with_context(|| format!("Invalid failure pattern: {failure_pattern}"))?;

    let mut detector = StuckAgentDetector::new(config);
    if let Some(ms) = timeout_ms {
        detector.set_timeout(Duration::from_millis(ms));
    }

    info!(pattern = %failure_pattern, "Watching agent output on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tracked = 0u64;
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        detector.track_output(&line);
        if pattern.is_match(&line) {
            debug!(line = %line, "Build failure marker matched");
            detector.track_build_failure();
        }
        tracked += 1;
    }

    info!(tracked, "Agent output ended");
    println!(
        "{} {} lines tracked",
        console::style("Watch finished:").bold(),
        tracked
    );
    Ok(())
}
