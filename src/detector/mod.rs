//! Stuck-agent detection.
//!
//! [`StuckAgentDetector`] observes one agent session incrementally: callers
//! feed it textual outputs and build-failure signals, and it escalates to an
//! automatic bug report when the agent appears hung or looping. Detection is
//! deliberately simple: three identical outputs in a row, three build
//! failures, or re-entry into tracking after the inactivity window has
//! lapsed.
//!
//! There is no background timer: the timeout is evaluated lazily, on the
//! next tracked output. An agent that goes silent and never tracks again is
//! never flagged.

mod state;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::errors::ReportError;
use crate::report::{BugBoardClient, BugReport, ReportSink, SubmittedReport};

use state::{BUILD_FAILURE_THRESHOLD, RetryDetectionState};

/// Watches one agent session and auto-files bug reports for stuck patterns.
///
/// One instance per logical agent session; state is mutated only by the
/// owning caller, so there is no internal locking. The tracking methods must
/// run inside a Tokio runtime: escalation submits the report on a spawned
/// background task the caller never awaits.
pub struct StuckAgentDetector {
    sink: Arc<dyn ReportSink>,
    state: RetryDetectionState,
    timeout: Duration,
}

impl StuckAgentDetector {
    /// Build a detector reporting through the hosted BugBoard API.
    pub fn new(config: ClientConfig) -> Self {
        let timeout = config.timeout;
        Self::with_sink(Arc::new(BugBoardClient::new(config)), timeout)
    }

    /// Build a detector reporting through an arbitrary sink.
    pub fn with_sink(sink: Arc<dyn ReportSink>, timeout: Duration) -> Self {
        Self {
            sink,
            state: RetryDetectionState::new(),
            timeout,
        }
    }

    /// Track one textual output from the agent, then evaluate the
    /// stuck-check. May trigger an automatic report.
    pub fn track_output(&mut self, output: &str) {
        // Idle time is measured up to the previous tracked event; pushing
        // the output below moves last_activity to now.
        let idle = self.state.idle_for();
        self.state.push_output(output);

        if idle > self.timeout {
            self.escalate("agent timed out");
            return;
        }
        if self.state.last_three_identical() {
            self.escalate("agent stuck in output loop");
        }
    }

    /// Track a build failure. Escalates once the failure count reaches the
    /// threshold.
    pub fn track_build_failure(&mut self) {
        let count = self.state.record_build_failure();
        if count >= BUILD_FAILURE_THRESHOLD {
            self.escalate("multiple build failures detected");
        }
    }

    /// Clear detection state back to its initial empty form. Idempotent.
    pub fn reset_retry_detection(&mut self) {
        self.state.reset();
    }

    /// Replace the inactivity window. Takes effect on the next evaluation.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Submit a report on behalf of the caller.
    ///
    /// This is the one path whose failure is not swallowed: transport and
    /// sink errors propagate so the caller can decide retry or display
    /// policy.
    pub async fn report_bug(&self, report: BugReport) -> Result<SubmittedReport, ReportError> {
        self.sink.submit(&report).await
    }

    /// The retained output history, oldest first. Read-only.
    pub fn output_history(&self) -> Vec<String> {
        self.state.outputs().map(str::to_string).collect()
    }

    /// Build failures tracked since the last reset. Read-only.
    pub fn build_failures(&self) -> u32 {
        self.state.build_failures()
    }

    /// File an automatic report and return to idle.
    ///
    /// State resets before the submission is spawned, so the condition that
    /// fired cannot immediately re-trigger and a failed submission still
    /// leaves a clean slate. The submission itself is fire-and-forget:
    /// failures are logged, never propagated, so automatic reporting cannot
    /// crash the host agent loop.
    fn escalate(&mut self, reason: &str) {
        let failures = self.state.build_failures();
        let report = BugReport::new("Auto-detected issue", self.state.joined_outputs())
            .with_error(format!("Auto-reported: {reason}. Build failures: {failures}"));
        self.state.reset();

        warn!(reason = %reason, failures, "Stuck agent detected, auto-reporting");

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match sink.submit(&report).await {
                Ok(submitted) => {
                    info!(id = %submitted.id, url = %submitted.url, "Auto-report filed");
                }
                Err(e) => {
                    warn!(error = %e, "Auto-report failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::time::advance;

    /// Sink that records every submitted report, optionally failing.
    struct RecordingSink {
        reports: Mutex<Vec<BugReport>>,
        submissions: AtomicUsize,
        fail: bool,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                reports: Mutex::new(Vec::new()),
                submissions: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reports: Mutex::new(Vec::new()),
                submissions: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn count(&self) -> usize {
            self.submissions.load(Ordering::SeqCst)
        }

        fn last_report(&self) -> BugReport {
            self.reports.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn submit(&self, report: &BugReport) -> Result<SubmittedReport, ReportError> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            self.reports.lock().unwrap().push(report.clone());
            if self.fail {
                return Err(ReportError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(SubmittedReport {
                id: "bug_1".to_string(),
                url: "https://bugboard.ai/bugs/bug_1".to_string(),
            })
        }
    }

    fn detector(sink: &Arc<RecordingSink>) -> StuckAgentDetector {
        StuckAgentDetector::with_sink(
            Arc::clone(sink) as Arc<dyn ReportSink>,
            Duration::from_millis(300_000),
        )
    }

    /// Let spawned escalation tasks run to completion on the current-thread
    /// test runtime.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_history_keeps_most_recent_five() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        for i in 0..7 {
            det.track_output(&format!("step {i}"));
        }
        assert_eq!(
            det.output_history(),
            vec!["step 2", "step 3", "step 4", "step 5", "step 6"]
        );
        settle().await;
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_three_identical_outputs_report_once_and_reset() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.track_output("retrying...");
        det.track_output("retrying...");
        det.track_output("retrying...");

        // State clears at escalation time, before the submission lands.
        assert!(det.output_history().is_empty());
        assert_eq!(det.build_failures(), 0);

        settle().await;
        assert_eq!(sink.count(), 1);

        let report = sink.last_report();
        assert_eq!(report.input, "Auto-detected issue");
        assert_eq!(report.logs, "retrying...\n---\nretrying...\n---\nretrying...");
        assert_eq!(
            report.error.as_deref(),
            Some("Auto-reported: agent stuck in output loop. Build failures: 0")
        );
    }

    #[tokio::test]
    async fn test_two_identical_then_distinct_does_not_report() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.track_output("same");
        det.track_output("same");
        det.track_output("different");
        settle().await;
        assert_eq!(sink.count(), 0);
        assert_eq!(det.output_history().len(), 3);
    }

    #[tokio::test]
    async fn test_three_build_failures_report_once_and_reset_counter() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.track_build_failure();
        det.track_build_failure();
        settle().await;
        assert_eq!(sink.count(), 0);

        det.track_build_failure();
        assert_eq!(det.build_failures(), 0);
        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(
            sink.last_report().error.as_deref(),
            Some("Auto-reported: multiple build failures detected. Build failures: 3")
        );

        // A fourth failure lands on the reset counter and must not
        // re-trigger.
        det.track_build_failure();
        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(det.build_failures(), 1);
    }

    #[tokio::test]
    async fn test_reset_then_single_event_does_not_escalate() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.track_output("same");
        det.track_output("same");
        det.reset_retry_detection();

        det.track_output("same");
        det.track_build_failure();
        settle().await;
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.reset_retry_detection();
        det.reset_retry_detection();
        assert!(det.output_history().is_empty());
        assert_eq!(det.build_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_before_repetition_check() {
        let sink = RecordingSink::new();
        let mut det = StuckAgentDetector::with_sink(
            Arc::clone(&sink) as Arc<dyn ReportSink>,
            Duration::from_millis(100),
        );

        det.track_output("a");
        advance(Duration::from_millis(150)).await;
        det.track_output("a");

        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(
            sink.last_report().error.as_deref(),
            Some("Auto-reported: agent timed out. Build failures: 0")
        );
        assert!(det.output_history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_within_window_does_not_time_out() {
        let sink = RecordingSink::new();
        let mut det = StuckAgentDetector::with_sink(
            Arc::clone(&sink) as Arc<dyn ReportSink>,
            Duration::from_millis(100),
        );

        det.track_output("a");
        advance(Duration::from_millis(50)).await;
        det.track_output("b");
        advance(Duration::from_millis(50)).await;
        det.track_output("c");

        settle().await;
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_timeout_takes_effect_on_next_evaluation() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);

        det.track_output("a");
        det.set_timeout(Duration::from_millis(50));
        advance(Duration::from_millis(80)).await;
        det.track_output("b");

        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(
            sink.last_report().error.as_deref(),
            Some("Auto-reported: agent timed out. Build failures: 0")
        );
    }

    #[tokio::test]
    async fn test_failed_auto_report_is_swallowed() {
        let sink = RecordingSink::failing();
        let mut det = detector(&sink);
        det.track_output("loop");
        det.track_output("loop");
        det.track_output("loop");
        settle().await;
        assert_eq!(sink.count(), 1);

        // The detector stays usable after a failed submission.
        assert!(det.output_history().is_empty());
        det.track_output("next");
        assert_eq!(det.output_history(), vec!["next"]);
    }

    #[tokio::test]
    async fn test_manual_report_propagates_sink_error() {
        let sink = RecordingSink::failing();
        let det = detector(&sink);
        let result = det.report_bug(BugReport::new("x", "y")).await;
        assert!(matches!(
            result,
            Err(ReportError::Rejected { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_manual_report_returns_submission() {
        let sink = RecordingSink::new();
        let det = detector(&sink);
        let submitted = det
            .report_bug(BugReport::new("input", "logs"))
            .await
            .unwrap();
        assert_eq!(submitted.id, "bug_1");
        assert!(submitted.url.contains("bug_1"));
        assert_eq!(sink.last_report().input, "input");
    }

    #[tokio::test]
    async fn test_build_failure_count_rides_along_on_loop_report() {
        let sink = RecordingSink::new();
        let mut det = detector(&sink);
        det.track_build_failure();
        det.track_build_failure();
        det.track_output("loop");
        det.track_output("loop");
        det.track_output("loop");
        settle().await;
        assert_eq!(sink.count(), 1);
        assert_eq!(
            sink.last_report().error.as_deref(),
            Some("Auto-reported: agent stuck in output loop. Build failures: 2")
        );
        assert_eq!(det.build_failures(), 0);
    }
}
