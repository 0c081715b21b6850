// crates/nexus-router-core/src/core/event.rs
// ============================================================================
// Module: Event Model
// Description: Event types, records, and typed per-type payloads.
// Purpose: Define the closed event vocabulary appended to the run log.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Events are immutable records appended to a per-run log at dense `seq`
//! positions starting at 0. The event type set is closed; payloads are typed
//! in-process and serialized to JSON objects at the store boundary. Readers
//! must treat stored payloads as untrusted and parse leniently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::AdapterId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::StepId;
use crate::core::plan::PlanStep;
use crate::core::plan::ToolCall;
use crate::core::request::RunOutcome;
use crate::core::request::StepStatus;
use crate::core::run::RunMode;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Closed set of event types appended by the router.
///
/// # Invariants
/// - Wire labels are SCREAMING_SNAKE_CASE and stable; the set only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Run accepted; first event of every run.
    RunStarted,
    /// Plan captured into the log.
    PlanCreated,
    /// Step execution began.
    StepStarted,
    /// Tool call handed to the dispatch adapter.
    ToolCallRequested,
    /// Tool call returned an object.
    ToolCallSucceeded,
    /// Tool call failed with a classified error.
    ToolCallFailed,
    /// Step execution finished.
    StepCompleted,
    /// Provenance summary recorded.
    ProvenanceEmitted,
    /// Terminal event for a successful run.
    RunCompleted,
    /// Terminal event for a failed run.
    RunFailed,
}

impl EventType {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "RUN_STARTED",
            Self::PlanCreated => "PLAN_CREATED",
            Self::StepStarted => "STEP_STARTED",
            Self::ToolCallRequested => "TOOL_CALL_REQUESTED",
            Self::ToolCallSucceeded => "TOOL_CALL_SUCCEEDED",
            Self::ToolCallFailed => "TOOL_CALL_FAILED",
            Self::StepCompleted => "STEP_COMPLETED",
            Self::ProvenanceEmitted => "PROVENANCE_EMITTED",
            Self::RunCompleted => "RUN_COMPLETED",
            Self::RunFailed => "RUN_FAILED",
        }
    }

    /// Parses a wire label back into an event type.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RUN_STARTED" => Some(Self::RunStarted),
            "PLAN_CREATED" => Some(Self::PlanCreated),
            "STEP_STARTED" => Some(Self::StepStarted),
            "TOOL_CALL_REQUESTED" => Some(Self::ToolCallRequested),
            "TOOL_CALL_SUCCEEDED" => Some(Self::ToolCallSucceeded),
            "TOOL_CALL_FAILED" => Some(Self::ToolCallFailed),
            "STEP_COMPLETED" => Some(Self::StepCompleted),
            "PROVENANCE_EMITTED" => Some(Self::ProvenanceEmitted),
            "RUN_COMPLETED" => Some(Self::RunCompleted),
            "RUN_FAILED" => Some(Self::RunFailed),
            _ => None,
        }
    }

    /// Returns true for the two terminal event types.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::RunCompleted | Self::RunFailed)
    }
}

// ============================================================================
// SECTION: Event Record
// ============================================================================

/// Persisted event row as read back from an event store.
///
/// # Invariants
/// - `(run_id, seq)` is unique; `seq` is dense from 0 within a run.
/// - `payload` is a JSON object; records are immutable after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Globally unique event identifier.
    pub event_id: EventId,
    /// Run the event belongs to.
    pub run_id: RunId,
    /// Dense per-run sequence number starting at 0.
    pub seq: u64,
    /// Event type drawn from the closed set.
    pub event_type: EventType,
    /// Event payload, opaque to the store and typed by `event_type`.
    pub payload: Value,
    /// Append timestamp assigned by the store.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Typed Payloads
// ============================================================================

/// Payload for `RUN_STARTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStartedPayload {
    /// Execution mode of the run.
    pub mode: RunMode,
    /// Free-text goal from the request.
    pub goal: String,
}

/// Payload for `PLAN_CREATED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCreatedPayload {
    /// The full plan in execution order.
    pub plan: Vec<PlanStep>,
}

/// Payload for `STEP_STARTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStartedPayload {
    /// Step identifier.
    pub step_id: StepId,
    /// Free-text step intent.
    pub intent: String,
}

/// Payload for `TOOL_CALL_REQUESTED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequestedPayload {
    /// Step identifier.
    pub step_id: StepId,
    /// The call handed to the adapter.
    pub call: ToolCall,
}

/// Payload for `TOOL_CALL_SUCCEEDED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallSucceededPayload {
    /// Step identifier.
    pub step_id: StepId,
    /// Object returned by the adapter (or the simulated placeholder).
    pub output: Map<String, Value>,
}

/// Payload for `TOOL_CALL_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFailedPayload {
    /// Step identifier.
    pub step_id: StepId,
    /// Stable error code for the failure class.
    pub error_code: String,
    /// Human-readable failure message.
    pub message: String,
}

/// Payload for `STEP_COMPLETED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCompletedPayload {
    /// Step identifier.
    pub step_id: StepId,
    /// Final step status.
    pub status: StepStatus,
}

/// Payload for `PROVENANCE_EMITTED`.
///
/// # Invariants
/// - The `provenance` shape is additive and versioned independently of the
///   event schema; consumers must ignore unknown fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEmittedPayload {
    /// Run provenance summary.
    pub provenance: ProvenanceRecord,
}

/// Provenance summary recorded at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Provenance payload version.
    pub version: String,
    /// Execution mode of the run.
    pub mode: RunMode,
    /// Adapter that executed (or would execute) the plan.
    pub adapter_id: AdapterId,
    /// Number of steps in the plan.
    pub steps_total: u64,
}

/// Payload for `RUN_COMPLETED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCompletedPayload {
    /// Final run outcome; always `ok` for this event.
    pub outcome: RunOutcome,
}

/// Payload for `RUN_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailedPayload {
    /// Stable failure reason (`policy_denied`, `adapter_bug`).
    pub reason: String,
}
