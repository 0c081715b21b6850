// crates/nexus-router-core/src/core/run.rs
// ============================================================================
// Module: Run Model
// Description: Run records, lifecycle status, and listing filters.
// Purpose: Define the run lifecycle shapes shared by stores and tools.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A run is one execution of a plan. It is created RUNNING before its first
//! event is appended and transitions exactly once to COMPLETED or FAILED at
//! the end of execution. Runs are never deleted by the core.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RunId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Run Mode
// ============================================================================

/// Execution mode requested for a run.
///
/// # Invariants
/// - Wire values are `dry_run` and `apply`; the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Simulate every tool call through the null adapter.
    DryRun,
    /// Execute tool calls through the configured adapter.
    Apply,
}

impl RunMode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::Apply => "apply",
        }
    }

    /// Parses a wire label back into a mode.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dry_run" => Some(Self::DryRun),
            "apply" => Some(Self::Apply),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Lifecycle status of a run.
///
/// # Invariants
/// - The only legal transition is RUNNING to COMPLETED or FAILED, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run has been created and may still append events.
    Running,
    /// Run finished with a `RUN_COMPLETED` terminal event.
    Completed,
    /// Run finished with a `RUN_FAILED` terminal event.
    Failed,
}

impl RunStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a wire label back into a status.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true when the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl core::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Run Record
// ============================================================================

/// Persisted run row as stored by an event store.
///
/// # Invariants
/// - `created_at` is assigned by the store at creation time.
/// - `status` agrees with the terminal event once one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run identifier.
    pub run_id: RunId,
    /// Execution mode the run was requested with.
    pub mode: RunMode,
    /// Free-text goal from the request.
    pub goal: String,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Creation timestamp assigned by the store.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Filters and Counts
// ============================================================================

/// Filter predicate for run listing and counting.
///
/// # Invariants
/// - Absent fields do not constrain the result set.
/// - `since` is an inclusive lower bound on `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    /// Restrict to a single run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    /// Restrict to runs with this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    /// Restrict to runs created at or after this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Timestamp>,
}

/// Aggregate run counts under a filter predicate.
///
/// # Invariants
/// - `runs_total` equals the sum of the per-status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Total runs matching the filter.
    pub runs_total: u64,
    /// Matching runs with status COMPLETED.
    pub completed: u64,
    /// Matching runs with status FAILED.
    pub failed: u64,
    /// Matching runs with status RUNNING.
    pub running: u64,
}
