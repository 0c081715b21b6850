// crates/nexus-router-core/src/core/plan.rs
// ============================================================================
// Module: Plan Model
// Description: Plan steps and tool call specifications.
// Purpose: Define the ordered plan shape carried by run requests.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A plan is an ordered sequence of steps supplied by the request. Tool and
//! method are opaque identifiers; the router copies what it needs into
//! events and otherwise forwards calls to the dispatch adapter unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::StepId;

// ============================================================================
// SECTION: Plan Shapes
// ============================================================================

/// One tool invocation as specified by a plan step.
///
/// # Invariants
/// - `tool` and `method` are opaque to the core.
/// - `args` is an arbitrary JSON object forwarded to the adapter verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier (for example `file-system`).
    pub tool: String,
    /// Method name on the tool (for example `read_file`).
    pub method: String,
    /// Arguments object for the method.
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// One element of a plan.
///
/// # Invariants
/// - `step_id` is unique within the plan; uniqueness is a request-level
///   concern and is not re-validated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Step identifier unique within the plan.
    pub step_id: StepId,
    /// Free-text description of what the step intends to do.
    pub intent: String,
    /// The tool call executed for this step.
    pub call: ToolCall,
}
