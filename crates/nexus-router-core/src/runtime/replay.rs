// crates/nexus-router-core/src/runtime/replay.rs
// ============================================================================
// Module: Run Replayer
// Description: Reconstructs a run view from events and checks invariants.
// Purpose: Prove a persisted event stream obeys the ordering invariants.
// Dependencies: crate::core, serde, serde_json
// ============================================================================

//! ## Overview
//! Replay is an immutable fold over a run's events in `seq` order. It
//! rebuilds a [`RunView`] and accumulates [`Violation`]s from a closed code
//! set. Payloads are untrusted: missing or malformed fields never abort the
//! fold, they simply leave the corresponding view fields unset.
//!
//! A step is *active* from its `STEP_STARTED` until its `STEP_COMPLETED`;
//! tool-call events referencing an inactive step are violations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::event::EventRecord;
use crate::core::event::EventType;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RunId;
use crate::core::request::RunOutcome;
use crate::core::run::RunMode;
use crate::core::run::RunRecord;
use crate::core::run::RunStatus;

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Closed set of invariant violation codes.
///
/// # Invariants
/// - Wire labels are SCREAMING_SNAKE_CASE and stable; the set only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// The referenced run does not exist.
    RunNotFound,
    /// Run has zero events.
    NoEvents,
    /// First event's `seq` is not 0.
    SeqNotZero,
    /// Event `seq` is not `previous + 1`.
    SeqGap,
    /// `RUN_STARTED` appears at a `seq` other than 0.
    RunStartedNotFirst,
    /// `PLAN_CREATED` appears before any `RUN_STARTED`.
    PlanBeforeRunStarted,
    /// `TOOL_CALL_REQUESTED` references an inactive step.
    ToolCallWithoutStep,
    /// `TOOL_CALL_SUCCEEDED`/`TOOL_CALL_FAILED` references an inactive step.
    ToolResultWithoutStep,
    /// `STEP_COMPLETED` references an inactive step.
    StepCompletedWithoutStart,
    /// No `RUN_STARTED` in the stream.
    NoRunStarted,
    /// No `PLAN_CREATED` in the stream.
    NoPlanCreated,
    /// No `RUN_COMPLETED` or `RUN_FAILED` in the stream.
    NoTerminalEvent,
}

impl ViolationCode {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunNotFound => "RUN_NOT_FOUND",
            Self::NoEvents => "NO_EVENTS",
            Self::SeqNotZero => "SEQ_NOT_ZERO",
            Self::SeqGap => "SEQ_GAP",
            Self::RunStartedNotFirst => "RUN_STARTED_NOT_FIRST",
            Self::PlanBeforeRunStarted => "PLAN_BEFORE_RUN_STARTED",
            Self::ToolCallWithoutStep => "TOOL_CALL_WITHOUT_STEP",
            Self::ToolResultWithoutStep => "TOOL_RESULT_WITHOUT_STEP",
            Self::StepCompletedWithoutStart => "STEP_COMPLETED_WITHOUT_START",
            Self::NoRunStarted => "NO_RUN_STARTED",
            Self::NoPlanCreated => "NO_PLAN_CREATED",
            Self::NoTerminalEvent => "NO_TERMINAL_EVENT",
        }
    }
}

/// One invariant violation found during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation code from the closed set.
    pub code: ViolationCode,
    /// Human-readable description.
    pub message: String,
    /// Sequence number of the offending event, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// Identifier of the offending event, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
}

impl Violation {
    /// Builds a stream-level violation with no offending event.
    #[must_use]
    pub fn stream(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            seq: None,
            event_id: None,
        }
    }

    /// Builds a violation anchored to a specific event.
    #[must_use]
    pub fn at_event(code: ViolationCode, message: impl Into<String>, event: &EventRecord) -> Self {
        Self {
            code,
            message: message.into(),
            seq: Some(event.seq),
            event_id: Some(event.event_id.clone()),
        }
    }
}

// ============================================================================
// SECTION: Run View
// ============================================================================

/// Timeline of one step as observed in the event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTimeline {
    /// Step identifier.
    pub step_id: String,
    /// Sequence of the step's `STEP_STARTED`, if seen.
    pub started_seq: Option<u64>,
    /// Sequence of the step's `STEP_COMPLETED`, if seen.
    pub completed_seq: Option<u64>,
    /// Sequence of the step's `TOOL_CALL_REQUESTED`, if seen.
    pub tool_call_requested_seq: Option<u64>,
    /// Sequence of the step's tool-call result, if seen.
    pub tool_call_result_seq: Option<u64>,
    /// Final step status from `STEP_COMPLETED`, if present.
    pub status: Option<String>,
}

/// Reconstructed view of a run from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunView {
    /// Run identifier.
    pub run_id: RunId,
    /// Persisted run status from the run record.
    pub status: RunStatus,
    /// Outcome derived from the terminal event, if one was seen.
    pub outcome: Option<RunOutcome>,
    /// Mode from the `RUN_STARTED` payload (falling back to the record).
    pub mode: Option<RunMode>,
    /// Goal from the `RUN_STARTED` payload (falling back to the record).
    pub goal: Option<String>,
    /// Per-step timelines keyed by step identifier.
    pub steps: BTreeMap<String, StepTimeline>,
    /// Distinct methods in first-seen order.
    pub tools_used: Vec<String>,
    /// Whether a `PROVENANCE_EMITTED` event was seen.
    pub provenance_present: bool,
    /// Terminal event type, if one was seen.
    pub terminal_event_type: Option<EventType>,
}

/// Result of replaying one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Whether the stream is structurally valid (always true when not strict).
    pub ok: bool,
    /// Reconstructed run view; absent when the run does not exist.
    pub run_view: Option<RunView>,
    /// Violations found; always reported regardless of `strict`.
    pub violations: Vec<Violation>,
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Replays a run's events and checks the ordering invariants.
#[must_use]
pub fn replay_run(run: &RunRecord, events: &[EventRecord], strict: bool) -> ReplayReport {
    let mut view = RunView {
        run_id: run.run_id.clone(),
        status: run.status,
        outcome: None,
        mode: Some(run.mode),
        goal: Some(run.goal.clone()),
        steps: BTreeMap::new(),
        tools_used: Vec::new(),
        provenance_present: false,
        terminal_event_type: None,
    };
    let mut violations = Vec::new();

    fold_events(events, &mut view, &mut violations);

    let ok = violations.is_empty() || !strict;
    ReplayReport {
        ok,
        run_view: Some(view),
        violations,
    }
}

/// Builds the report returned when the run identifier is unknown.
#[must_use]
pub fn run_not_found(run_id: &RunId) -> ReplayReport {
    ReplayReport {
        ok: false,
        run_view: None,
        violations: vec![Violation::stream(
            ViolationCode::RunNotFound,
            format!("run {run_id} not found"),
        )],
    }
}

/// Folds the event stream into the view, accumulating violations.
fn fold_events(events: &[EventRecord], view: &mut RunView, violations: &mut Vec<Violation>) {
    if events.is_empty() {
        violations.push(Violation::stream(ViolationCode::NoEvents, "run has no events"));
        return;
    }

    let mut seen_run_started = false;
    let mut seen_plan_created = false;
    let mut seen_terminal = false;
    let mut prev_seq: Option<u64> = None;
    let mut active_steps: BTreeMap<String, u64> = BTreeMap::new();

    for event in events {
        check_sequence(event, prev_seq, violations);
        prev_seq = Some(event.seq);

        match event.event_type {
            EventType::RunStarted => {
                if event.seq != 0 {
                    violations.push(Violation::at_event(
                        ViolationCode::RunStartedNotFirst,
                        format!("RUN_STARTED should be seq 0, found at {}", event.seq),
                        event,
                    ));
                }
                seen_run_started = true;
                view.mode = payload_str(&event.payload, "mode").and_then(RunMode::parse);
                view.goal = payload_str(&event.payload, "goal").map(ToString::to_string);
            }
            EventType::PlanCreated => {
                if !seen_run_started {
                    violations.push(Violation::at_event(
                        ViolationCode::PlanBeforeRunStarted,
                        "PLAN_CREATED appeared before RUN_STARTED",
                        event,
                    ));
                }
                seen_plan_created = true;
            }
            EventType::StepStarted => {
                if let Some(step_id) = payload_str(&event.payload, "step_id") {
                    let timeline = timeline_entry(&mut view.steps, step_id);
                    timeline.started_seq = Some(event.seq);
                    active_steps.insert(step_id.to_string(), event.seq);
                }
            }
            EventType::ToolCallRequested => {
                track_tool_call_requested(event, view, &active_steps, violations);
            }
            EventType::ToolCallSucceeded | EventType::ToolCallFailed => {
                if let Some(step_id) = payload_str(&event.payload, "step_id") {
                    if !active_steps.contains_key(step_id) {
                        violations.push(Violation::at_event(
                            ViolationCode::ToolResultWithoutStep,
                            format!("tool result for {step_id} without STEP_STARTED"),
                            event,
                        ));
                    }
                    if let Some(timeline) = view.steps.get_mut(step_id) {
                        timeline.tool_call_result_seq = Some(event.seq);
                    }
                }
            }
            EventType::StepCompleted => {
                if let Some(step_id) = payload_str(&event.payload, "step_id") {
                    if !active_steps.contains_key(step_id) {
                        violations.push(Violation::at_event(
                            ViolationCode::StepCompletedWithoutStart,
                            format!("STEP_COMPLETED for {step_id} without STEP_STARTED"),
                            event,
                        ));
                    }
                    if let Some(timeline) = view.steps.get_mut(step_id) {
                        timeline.completed_seq = Some(event.seq);
                        timeline.status =
                            payload_str(&event.payload, "status").map(ToString::to_string);
                    }
                    active_steps.remove(step_id);
                }
            }
            EventType::ProvenanceEmitted => {
                view.provenance_present = true;
            }
            EventType::RunCompleted => {
                seen_terminal = true;
                view.terminal_event_type = Some(EventType::RunCompleted);
                view.outcome = Some(RunOutcome::Ok);
            }
            EventType::RunFailed => {
                seen_terminal = true;
                view.terminal_event_type = Some(EventType::RunFailed);
                view.outcome = Some(RunOutcome::Error);
            }
        }
    }

    if !seen_run_started {
        violations
            .push(Violation::stream(ViolationCode::NoRunStarted, "RUN_STARTED event not found"));
    }
    if !seen_plan_created {
        violations
            .push(Violation::stream(ViolationCode::NoPlanCreated, "PLAN_CREATED event not found"));
    }
    if !seen_terminal {
        violations.push(Violation::stream(
            ViolationCode::NoTerminalEvent,
            "no terminal event (RUN_COMPLETED or RUN_FAILED) found",
        ));
    }
}

/// Checks seq density against the previous event.
fn check_sequence(event: &EventRecord, prev_seq: Option<u64>, violations: &mut Vec<Violation>) {
    match prev_seq {
        None => {
            if event.seq != 0 {
                violations.push(Violation::at_event(
                    ViolationCode::SeqNotZero,
                    format!("first event seq should be 0, got {}", event.seq),
                    event,
                ));
            }
        }
        Some(prev) => {
            if event.seq != prev + 1 {
                violations.push(Violation::at_event(
                    ViolationCode::SeqGap,
                    format!("expected seq {}, got {}", prev + 1, event.seq),
                    event,
                ));
            }
        }
    }
}

/// Handles `TOOL_CALL_REQUESTED` tracking and violations.
fn track_tool_call_requested(
    event: &EventRecord,
    view: &mut RunView,
    active_steps: &BTreeMap<String, u64>,
    violations: &mut Vec<Violation>,
) {
    if let Some(step_id) = payload_str(&event.payload, "step_id") {
        if !active_steps.contains_key(step_id) {
            violations.push(Violation::at_event(
                ViolationCode::ToolCallWithoutStep,
                format!("TOOL_CALL_REQUESTED for {step_id} without STEP_STARTED"),
                event,
            ));
        }
        if let Some(timeline) = view.steps.get_mut(step_id) {
            timeline.tool_call_requested_seq = Some(event.seq);
        }
    }
    let method = event
        .payload
        .get("call")
        .and_then(|call| call.get("method"))
        .and_then(Value::as_str);
    if let Some(method) = method
        && !view.tools_used.iter().any(|seen| seen == method)
    {
        view.tools_used.push(method.to_string());
    }
}

/// Returns the named string field of an untrusted payload, if present.
fn payload_str<'p>(payload: &'p Value, key: &str) -> Option<&'p str> {
    payload.get(key).and_then(Value::as_str)
}

/// Returns (creating on demand) the timeline entry for a step.
fn timeline_entry<'s>(
    steps: &'s mut BTreeMap<String, StepTimeline>,
    step_id: &str,
) -> &'s mut StepTimeline {
    steps.entry(step_id.to_string()).or_insert_with(|| StepTimeline {
        step_id: step_id.to_string(),
        ..StepTimeline::default()
    })
}
