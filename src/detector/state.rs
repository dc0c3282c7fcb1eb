//! Retry-detection state for one agent session.

use std::collections::VecDeque;

use tokio::time::Instant;

/// Most recent outputs retained for repetition checks.
pub(crate) const OUTPUT_HISTORY_CAPACITY: usize = 5;

/// Identical consecutive outputs needed to count as a loop.
pub(crate) const REPEAT_THRESHOLD: usize = 3;

/// Build failures tolerated before escalating.
pub(crate) const BUILD_FAILURE_THRESHOLD: u32 = 3;

/// Separator between history entries in the escalation log blob.
pub(crate) const LOG_SEPARATOR: &str = "\n---\n";

/// Transient per-session detection state.
///
/// Holds the bounded output history, the build-failure counter, and the
/// instant of the last tracked event. Dies with the session; nothing is
/// persisted.
#[derive(Debug)]
pub(crate) struct RetryDetectionState {
    outputs: VecDeque<String>,
    build_failures: u32,
    last_activity: Instant,
}

impl RetryDetectionState {
    pub(crate) fn new() -> Self {
        Self {
            outputs: VecDeque::with_capacity(OUTPUT_HISTORY_CAPACITY),
            build_failures: 0,
            last_activity: Instant::now(),
        }
    }

    /// Time since the last tracked event. Read-only; does not touch
    /// `last_activity`.
    pub(crate) fn idle_for(&self) -> std::time::Duration {
        self.last_activity.elapsed()
    }

    /// Append an output, evicting the oldest entry past capacity, and mark
    /// activity.
    pub(crate) fn push_output(&mut self, output: &str) {
        if self.outputs.len() == OUTPUT_HISTORY_CAPACITY {
            self.outputs.pop_front();
        }
        self.outputs.push_back(output.to_string());
        self.last_activity = Instant::now();
    }

    /// Increment the build-failure counter, mark activity, and return the
    /// new count.
    pub(crate) fn record_build_failure(&mut self) -> u32 {
        self.build_failures += 1;
        self.last_activity = Instant::now();
        self.build_failures
    }

    /// Whether the three most recent outputs are exactly equal.
    ///
    /// Exact string comparison; no normalization or fuzzy matching.
    pub(crate) fn last_three_identical(&self) -> bool {
        if self.outputs.len() < REPEAT_THRESHOLD {
            return false;
        }
        let mut recent = self.outputs.iter().rev().take(REPEAT_THRESHOLD);
        let newest = match recent.next() {
            Some(o) => o,
            None => return false,
        };
        recent.all(|o| o == newest)
    }

    /// The retained history joined with a visible separator, oldest first.
    pub(crate) fn joined_outputs(&self) -> String {
        self.outputs
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(LOG_SEPARATOR)
    }

    pub(crate) fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    pub(crate) fn build_failures(&self) -> u32 {
        self.build_failures
    }

    /// Return to the initial empty form.
    pub(crate) fn reset(&mut self) {
        self.outputs.clear();
        self.build_failures = 0;
        self.last_activity = Instant::now();
    }
}
