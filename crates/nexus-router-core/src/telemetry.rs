// crates/nexus-router-core/src/telemetry.rs
// ============================================================================
// Module: Router Telemetry
// Description: Observability hooks for run and tool-call outcomes.
// Purpose: Provide metric events without hard observability dependencies.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for run and tool-call
//! counters. It is intentionally dependency-light so downstream deployments
//! can plug in Prometheus or OpenTelemetry without redesign. Labels must not
//! carry payload contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Tool-call outcome classification for telemetry labeling.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallOutcome {
    /// The adapter returned an object.
    Succeeded,
    /// The adapter failed operationally; the run continued.
    OperationalFailure,
    /// The adapter failed with a defect; the run aborted.
    BugFailure,
}

impl ToolCallOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::OperationalFailure => "operational_failure",
            Self::BugFailure => "bug_failure",
        }
    }
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Metrics sink receiving router events.
///
/// Implementations must be cheap and non-blocking; the router calls them on
/// its hot path.
pub trait MetricsSink: Send + Sync {
    /// Records a run that reached `RUN_COMPLETED`.
    fn record_run_completed(&self);

    /// Records a run that reached `RUN_FAILED`, labeled by reason.
    fn record_run_failed(&self, reason: &str);

    /// Records one tool-call outcome.
    fn record_tool_call(&self, outcome: ToolCallOutcome);
}

/// Metrics sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record_run_completed(&self) {}

    fn record_run_failed(&self, _reason: &str) {}

    fn record_tool_call(&self, _outcome: ToolCallOutcome) {}
}

// ============================================================================
// SECTION: In-Memory Sink
// ============================================================================

/// Snapshot of counters accumulated by [`CountingMetricsSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Runs that completed.
    pub runs_completed: u64,
    /// Runs that failed.
    pub runs_failed: u64,
    /// Tool calls that succeeded.
    pub tool_calls_succeeded: u64,
    /// Tool calls that failed operationally.
    pub tool_calls_operational: u64,
    /// Tool calls that failed with a defect.
    pub tool_calls_bug: u64,
}

/// In-process counting sink for tests and local diagnostics.
#[derive(Debug, Default)]
pub struct CountingMetricsSink {
    /// Runs that completed.
    runs_completed: AtomicU64,
    /// Runs that failed.
    runs_failed: AtomicU64,
    /// Tool calls that succeeded.
    tool_calls_succeeded: AtomicU64,
    /// Tool calls that failed operationally.
    tool_calls_operational: AtomicU64,
    /// Tool calls that failed with a defect.
    tool_calls_bug: AtomicU64,
}

impl CountingMetricsSink {
    /// Creates a sink with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a consistent snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            tool_calls_succeeded: self.tool_calls_succeeded.load(Ordering::Relaxed),
            tool_calls_operational: self.tool_calls_operational.load(Ordering::Relaxed),
            tool_calls_bug: self.tool_calls_bug.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSink for CountingMetricsSink {
    fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_run_failed(&self, _reason: &str) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_tool_call(&self, outcome: ToolCallOutcome) {
        match outcome {
            ToolCallOutcome::Succeeded => {
                self.tool_calls_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            ToolCallOutcome::OperationalFailure => {
                self.tool_calls_operational.fetch_add(1, Ordering::Relaxed);
            }
            ToolCallOutcome::BugFailure => {
                self.tool_calls_bug.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
