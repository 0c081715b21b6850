// crates/nexus-router-core/tests/replay_invariants.rs
// ============================================================================
// Module: Replay Invariant Tests
// Description: Verifies the replay fold and its closed violation set.
// ============================================================================
//! ## Overview
//! Exercises the replayer against hand-built event streams: valid streams,
//! sequencing defects, orphaned step events, missing markers, and the
//! strict/lenient reporting split.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use nexus_router_core::EventRecord;
use nexus_router_core::EventType;
use nexus_router_core::RunId;
use nexus_router_core::RunMode;
use nexus_router_core::RunRecord;
use nexus_router_core::RunStatus;
use nexus_router_core::Timestamp;
use nexus_router_core::ViolationCode;
use nexus_router_core::core::request::RunOutcome;
use nexus_router_core::runtime::replay::replay_run;
use nexus_router_core::runtime::replay::run_not_found;
use proptest::prelude::any;
use proptest::prop_assert;
use proptest::proptest;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sample_run(status: RunStatus) -> RunRecord {
    RunRecord {
        run_id: RunId::new("run-1"),
        mode: RunMode::DryRun,
        goal: "demo goal".to_string(),
        status,
        created_at: Timestamp::from_wire("2026-01-01T00:00:00Z"),
    }
}

fn event(seq: u64, event_type: EventType, payload: Value) -> EventRecord {
    EventRecord {
        event_id: nexus_router_core::EventId::new(format!("evt-{seq}")),
        run_id: RunId::new("run-1"),
        seq,
        event_type,
        payload,
        created_at: Timestamp::from_wire("2026-01-01T00:00:01Z"),
    }
}

/// A structurally valid single-step stream, the shape the router emits.
fn valid_stream() -> Vec<EventRecord> {
    vec![
        event(0, EventType::RunStarted, json!({"mode": "dry_run", "goal": "demo goal"})),
        event(
            1,
            EventType::PlanCreated,
            json!({"plan": [{"step_id": "s1", "intent": "i", "call": {"tool": "t", "method": "m", "args": {}}}]}),
        ),
        event(2, EventType::StepStarted, json!({"step_id": "s1", "intent": "i"})),
        event(
            3,
            EventType::ToolCallRequested,
            json!({"step_id": "s1", "call": {"tool": "t", "method": "m", "args": {}}}),
        ),
        event(4, EventType::ToolCallSucceeded, json!({"step_id": "s1", "output": {}})),
        event(5, EventType::StepCompleted, json!({"step_id": "s1", "status": "ok"})),
        event(6, EventType::ProvenanceEmitted, json!({"provenance": {"version": "v0.1"}})),
        event(7, EventType::RunCompleted, json!({"outcome": "ok"})),
    ]
}

fn codes(report: &nexus_router_core::ReplayReport) -> Vec<ViolationCode> {
    report.violations.iter().map(|violation| violation.code).collect()
}

// ============================================================================
// SECTION: Valid Streams
// ============================================================================

#[test]
fn valid_stream_replays_clean() {
    let run = sample_run(RunStatus::Completed);
    let report = replay_run(&run, &valid_stream(), true);

    assert!(report.ok);
    assert!(report.violations.is_empty());

    let view = report.run_view.expect("run view");
    assert_eq!(view.mode, Some(RunMode::DryRun));
    assert_eq!(view.goal.as_deref(), Some("demo goal"));
    assert_eq!(view.outcome, Some(RunOutcome::Ok));
    assert_eq!(view.terminal_event_type, Some(EventType::RunCompleted));
    assert!(view.provenance_present);
    assert_eq!(view.tools_used, vec!["m".to_string()]);

    let timeline = view.steps.get("s1").expect("step timeline");
    assert_eq!(timeline.started_seq, Some(2));
    assert_eq!(timeline.tool_call_requested_seq, Some(3));
    assert_eq!(timeline.tool_call_result_seq, Some(4));
    assert_eq!(timeline.completed_seq, Some(5));
    assert_eq!(timeline.status.as_deref(), Some("ok"));
}

#[test]
fn policy_denied_stream_is_structurally_valid() {
    let run = sample_run(RunStatus::Failed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "apply", "goal": "demo goal"})),
        event(1, EventType::PlanCreated, json!({"plan": [{"step_id": "s1"}]})),
        event(2, EventType::RunFailed, json!({"reason": "policy_denied"})),
    ];
    let report = replay_run(&run, &events, true);

    assert!(report.ok);
    let view = report.run_view.expect("run view");
    assert_eq!(view.outcome, Some(RunOutcome::Error));
    assert_eq!(view.terminal_event_type, Some(EventType::RunFailed));
    assert!(view.steps.is_empty());
}

// ============================================================================
// SECTION: Sequencing Violations
// ============================================================================

#[test]
fn empty_stream_reports_no_events_only() {
    let run = sample_run(RunStatus::Running);
    let report = replay_run(&run, &[], true);

    assert!(!report.ok);
    assert_eq!(codes(&report), vec![ViolationCode::NoEvents]);
}

#[test]
fn nonzero_first_seq_is_flagged() {
    let run = sample_run(RunStatus::Completed);
    let mut events = valid_stream();
    for record in &mut events {
        record.seq += 1;
    }
    let report = replay_run(&run, &events, true);

    assert!(!report.ok);
    assert!(codes(&report).contains(&ViolationCode::SeqNotZero));
    assert!(codes(&report).contains(&ViolationCode::RunStartedNotFirst));
}

#[test]
fn seq_gap_is_flagged_with_position() {
    let run = sample_run(RunStatus::Completed);
    let mut events = valid_stream();
    events[4].seq = 9;
    let report = replay_run(&run, &events, true);

    assert!(!report.ok);
    let gap = report
        .violations
        .iter()
        .find(|violation| violation.code == ViolationCode::SeqGap)
        .expect("seq gap violation");
    assert_eq!(gap.seq, Some(9));
    assert!(gap.event_id.is_some());
}

proptest! {
    #[test]
    fn any_single_gap_is_flagged(offset in 1_u64..50, position in any::<proptest::sample::Index>()) {
        let run = sample_run(RunStatus::Completed);
        let mut events = valid_stream();
        let index = position.index(events.len() - 1) + 1;
        for record in events.iter_mut().skip(index) {
            record.seq += offset;
        }
        let report = replay_run(&run, &events, true);
        prop_assert!(!report.ok);
        prop_assert!(report.violations.iter().any(|violation| violation.code == ViolationCode::SeqGap));
    }
}

// ============================================================================
// SECTION: Step Lifecycle Violations
// ============================================================================

#[test]
fn orphan_step_completed_is_flagged() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "dry_run", "goal": "demo goal"})),
        event(1, EventType::PlanCreated, json!({"plan": []})),
        event(2, EventType::StepCompleted, json!({"step_id": "orphan", "status": "ok"})),
        event(3, EventType::ProvenanceEmitted, json!({"provenance": {}})),
        event(4, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];
    let report = replay_run(&run, &events, true);

    assert!(!report.ok);
    assert_eq!(codes(&report), vec![ViolationCode::StepCompletedWithoutStart]);
}

#[test]
fn tool_call_before_step_started_is_flagged() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "dry_run", "goal": "demo goal"})),
        event(1, EventType::PlanCreated, json!({"plan": []})),
        event(
            2,
            EventType::ToolCallRequested,
            json!({"step_id": "s1", "call": {"tool": "t", "method": "m", "args": {}}}),
        ),
        event(3, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];
    let report = replay_run(&run, &events, true);

    assert!(codes(&report).contains(&ViolationCode::ToolCallWithoutStep));
}

#[test]
fn tool_result_after_step_completed_is_flagged() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "dry_run", "goal": "demo goal"})),
        event(1, EventType::PlanCreated, json!({"plan": []})),
        event(2, EventType::StepStarted, json!({"step_id": "s1", "intent": "i"})),
        event(3, EventType::StepCompleted, json!({"step_id": "s1", "status": "ok"})),
        event(4, EventType::ToolCallSucceeded, json!({"step_id": "s1", "output": {}})),
        event(5, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];
    let report = replay_run(&run, &events, true);

    assert!(codes(&report).contains(&ViolationCode::ToolResultWithoutStep));
}

// ============================================================================
// SECTION: Missing Markers
// ============================================================================

#[test]
fn plan_before_run_started_is_flagged() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::PlanCreated, json!({"plan": []})),
        event(1, EventType::RunStarted, json!({"mode": "dry_run", "goal": "demo goal"})),
        event(2, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];
    let report = replay_run(&run, &events, true);

    assert!(codes(&report).contains(&ViolationCode::PlanBeforeRunStarted));
    assert!(codes(&report).contains(&ViolationCode::RunStartedNotFirst));
}

#[test]
fn missing_markers_are_reported_at_end_of_fold() {
    let run = sample_run(RunStatus::Running);
    let events =
        vec![event(0, EventType::StepStarted, json!({"step_id": "s1", "intent": "i"}))];
    let report = replay_run(&run, &events, true);

    let found = codes(&report);
    assert!(found.contains(&ViolationCode::NoRunStarted));
    assert!(found.contains(&ViolationCode::NoPlanCreated));
    assert!(found.contains(&ViolationCode::NoTerminalEvent));
}

// ============================================================================
// SECTION: Strictness and Lookup
// ============================================================================

#[test]
fn lenient_mode_reports_violations_but_stays_ok() {
    let run = sample_run(RunStatus::Running);
    let report = replay_run(&run, &[], false);

    assert!(report.ok);
    assert_eq!(codes(&report), vec![ViolationCode::NoEvents]);
}

#[test]
fn unknown_run_yields_run_not_found() {
    let report = run_not_found(&RunId::new("run-missing"));

    assert!(!report.ok);
    assert!(report.run_view.is_none());
    assert_eq!(codes(&report), vec![ViolationCode::RunNotFound]);
    assert!(report.violations[0].message.contains("run-missing"));
}
