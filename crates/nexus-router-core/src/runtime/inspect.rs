// crates/nexus-router-core/src/runtime/inspect.rs
// ============================================================================
// Module: Run Inspector
// Description: Derives per-run summaries from events without validation.
// Purpose: Provide the aggregate read path over many runs.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! The inspector is a summary view: it paginates runs, counts them by
//! status, and derives lightweight per-run fields from events. It never
//! checks invariants; a structurally broken run still summarizes. Payloads
//! are untrusted and parsed leniently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::event::EventRecord;
use crate::core::event::EventType;
use crate::core::identifiers::RunId;
use crate::core::request::RunOutcome;
use crate::core::run::RunCounts;
use crate::core::run::RunMode;
use crate::core::run::RunRecord;
use crate::core::run::RunStatus;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Digest Shapes
// ============================================================================

/// Summary of one run derived from its row and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDigest {
    /// Run identifier.
    pub run_id: RunId,
    /// Execution mode of the run.
    pub mode: RunMode,
    /// Free-text goal from the request.
    pub goal: String,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Creation timestamp assigned by the store.
    pub created_at: Timestamp,
    /// Number of steps in the `PLAN_CREATED` payload.
    pub steps_planned: u64,
    /// Number of `STEP_STARTED` events.
    pub steps_executed: u64,
    /// Distinct methods in first-seen order.
    pub tools_used: Vec<String>,
    /// Outcome from the terminal event, absent while the run is live.
    pub outcome: Option<RunOutcome>,
    /// Reason from the latest `RUN_FAILED` payload, if any.
    pub last_failure_reason: Option<String>,
}

/// Response returned by the inspect tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectReport {
    /// Aggregate counts under the active filter.
    pub summary: RunCounts,
    /// Filtered, paginated run digests ordered by `created_at` descending.
    pub runs: Vec<RunDigest>,
}

// ============================================================================
// SECTION: Summaries
// ============================================================================

/// Derives the digest of one run from its record and events.
#[must_use]
pub fn summarize_run(run: &RunRecord, events: &[EventRecord]) -> RunDigest {
    let mut steps_planned = 0_u64;
    let mut steps_executed = 0_u64;
    let mut tools_used: Vec<String> = Vec::new();
    let mut outcome = None;
    let mut last_failure_reason = None;

    for event in events {
        match event.event_type {
            EventType::PlanCreated => {
                steps_planned = event
                    .payload
                    .get("plan")
                    .and_then(Value::as_array)
                    .map_or(0, |plan| u64::try_from(plan.len()).unwrap_or(u64::MAX));
            }
            EventType::StepStarted => {
                steps_executed += 1;
            }
            EventType::ToolCallRequested => {
                let method = event
                    .payload
                    .get("call")
                    .and_then(|call| call.get("method"))
                    .and_then(Value::as_str);
                if let Some(method) = method
                    && !tools_used.iter().any(|seen| seen == method)
                {
                    tools_used.push(method.to_string());
                }
            }
            EventType::RunCompleted => {
                outcome = Some(RunOutcome::Ok);
            }
            EventType::RunFailed => {
                outcome = Some(RunOutcome::Error);
                if let Some(reason) = event.payload.get("reason").and_then(Value::as_str) {
                    last_failure_reason = Some(reason.to_string());
                }
            }
            EventType::RunStarted
            | EventType::StepCompleted
            | EventType::ToolCallSucceeded
            | EventType::ToolCallFailed
            | EventType::ProvenanceEmitted => {}
        }
    }

    RunDigest {
        run_id: run.run_id.clone(),
        mode: run.mode,
        goal: run.goal.clone(),
        status: run.status,
        created_at: run.created_at.clone(),
        steps_planned,
        steps_executed,
        tools_used,
        outcome,
        last_failure_reason,
    }
}
