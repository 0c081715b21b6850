// crates/nexus-router-core/src/core/request.rs
// ============================================================================
// Module: Request and Response Shapes
// Description: Run request, run response, and per-step results.
// Purpose: Define the validated payloads exchanged with the run tool.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! These shapes mirror the versioned request/response schemas published by
//! the contract crate. The core only ever consumes requests that already
//! passed schema validation; deserialization failures here indicate a host
//! integration bug, not bad user input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::AdapterId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::StepId;
use crate::core::plan::PlanStep;
use crate::core::policy::RunPolicy;
use crate::core::run::RunMode;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Validated run request.
///
/// # Invariants
/// - `plan_override` preserves request order; an absent plan is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Free-text goal for the run.
    pub goal: String,
    /// Requested execution mode.
    pub mode: RunMode,
    /// Optional policy gating apply-mode execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<RunPolicy>,
    /// Ordered plan of tool calls to execute.
    #[serde(default)]
    pub plan_override: Vec<PlanStep>,
}

// ============================================================================
// SECTION: Response
// ============================================================================

/// Final outcome of a run as reported in summaries.
///
/// # Invariants
/// - `ok` corresponds to `RUN_COMPLETED`; `error` to `RUN_FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The run completed.
    Ok,
    /// The run failed (policy denial or adapter bug).
    Error,
}

impl RunOutcome {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Final status of one executed step.
///
/// # Invariants
/// - `ok` corresponds to `TOOL_CALL_SUCCEEDED`; `error` to `TOOL_CALL_FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The tool call produced an object.
    Ok,
    /// The tool call failed.
    Error,
}

impl StepStatus {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Reference to the run a response belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRef {
    /// Run identifier assigned by the store.
    pub run_id: RunId,
}

/// Aggregated outcome of a run.
///
/// # Invariants
/// - `outputs_applied` counts successful apply-mode steps.
/// - `outputs_skipped` counts steps that failed operationally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Execution mode of the run.
    pub mode: RunMode,
    /// Adapter that executed the plan (the null adapter for dry runs).
    pub adapter_id: AdapterId,
    /// Successful steps in apply mode.
    pub outputs_applied: u64,
    /// Steps skipped after an operational failure.
    pub outputs_skipped: u64,
    /// Final run outcome.
    pub outcome: RunOutcome,
}

/// Per-step entry in the run response.
///
/// # Invariants
/// - `output` is present exactly when `status` is `ok`.
/// - `error_code` and `message` are present exactly when `status` is `error`.
/// - `simulated` is present (and `true`) only for dry-run steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Step identifier.
    pub step_id: StepId,
    /// Final step status.
    pub status: StepStatus,
    /// Tool output for successful steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,
    /// Stable error code for failed steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable message for failed steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Marker set on dry-run step results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated: Option<bool>,
}

/// Response returned by the run tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Reference to the persisted run.
    pub run: RunRef,
    /// Aggregated outcome of the run.
    pub summary: RunSummary,
    /// Per-step results in plan order.
    pub results: Vec<StepResult>,
}
