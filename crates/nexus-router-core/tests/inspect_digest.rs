// crates/nexus-router-core/tests/inspect_digest.rs
// ============================================================================
// Module: Inspector Digest Tests
// Description: Verifies per-run summary derivation from event streams.
// ============================================================================
//! ## Overview
//! The inspector never validates; these tests confirm it derives planned and
//! executed step counts, first-seen tool methods, outcomes, and failure
//! reasons even from streams a strict replay would reject.

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

use nexus_router_core::EventId;
use nexus_router_core::EventRecord;
use nexus_router_core::EventType;
use nexus_router_core::RunId;
use nexus_router_core::RunMode;
use nexus_router_core::RunRecord;
use nexus_router_core::RunStatus;
use nexus_router_core::Timestamp;
use nexus_router_core::core::request::RunOutcome;
use nexus_router_core::runtime::inspect::summarize_run;
use serde_json::Value;
use serde_json::json;

fn sample_run(status: RunStatus) -> RunRecord {
    RunRecord {
        run_id: RunId::new("run-1"),
        mode: RunMode::Apply,
        goal: "apply things".to_string(),
        status,
        created_at: Timestamp::from_wire("2026-01-01T00:00:00Z"),
    }
}

fn event(seq: u64, event_type: EventType, payload: Value) -> EventRecord {
    EventRecord {
        event_id: EventId::new(format!("evt-{seq}")),
        run_id: RunId::new("run-1"),
        seq,
        event_type,
        payload,
        created_at: Timestamp::from_wire("2026-01-01T00:00:01Z"),
    }
}

#[test]
fn digest_counts_planned_and_executed_steps() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "apply", "goal": "apply things"})),
        event(
            1,
            EventType::PlanCreated,
            json!({"plan": [{"step_id": "s1"}, {"step_id": "s2"}, {"step_id": "s3"}]}),
        ),
        event(2, EventType::StepStarted, json!({"step_id": "s1", "intent": "a"})),
        event(3, EventType::StepStarted, json!({"step_id": "s2", "intent": "b"})),
        event(4, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];

    let digest = summarize_run(&run, &events);
    assert_eq!(digest.steps_planned, 3);
    assert_eq!(digest.steps_executed, 2);
    assert_eq!(digest.outcome, Some(RunOutcome::Ok));
    assert!(digest.last_failure_reason.is_none());
}

#[test]
fn digest_tracks_distinct_methods_in_first_seen_order() {
    let run = sample_run(RunStatus::Completed);
    let call = |method: &str| {
        json!({"step_id": "s", "call": {"tool": "t", "method": method, "args": {}}})
    };
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "apply", "goal": "g"})),
        event(1, EventType::PlanCreated, json!({"plan": []})),
        event(2, EventType::ToolCallRequested, call("write")),
        event(3, EventType::ToolCallRequested, call("read")),
        event(4, EventType::ToolCallRequested, call("write")),
        event(5, EventType::RunCompleted, json!({"outcome": "ok"})),
    ];

    let digest = summarize_run(&run, &events);
    assert_eq!(digest.tools_used, vec!["write".to_string(), "read".to_string()]);
}

#[test]
fn digest_reports_latest_failure_reason() {
    let run = sample_run(RunStatus::Failed);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "apply", "goal": "g"})),
        event(1, EventType::PlanCreated, json!({"plan": [{"step_id": "s1"}]})),
        event(2, EventType::RunFailed, json!({"reason": "policy_denied"})),
    ];

    let digest = summarize_run(&run, &events);
    assert_eq!(digest.outcome, Some(RunOutcome::Error));
    assert_eq!(digest.last_failure_reason.as_deref(), Some("policy_denied"));
}

#[test]
fn digest_of_live_run_has_no_outcome() {
    let run = sample_run(RunStatus::Running);
    let events = vec![
        event(0, EventType::RunStarted, json!({"mode": "apply", "goal": "g"})),
        event(1, EventType::PlanCreated, json!({"plan": []})),
    ];

    let digest = summarize_run(&run, &events);
    assert!(digest.outcome.is_none());
    assert_eq!(digest.status, RunStatus::Running);
}

#[test]
fn digest_survives_malformed_payloads() {
    let run = sample_run(RunStatus::Completed);
    let events = vec![
        event(0, EventType::RunStarted, json!("not an object")),
        event(1, EventType::PlanCreated, json!({"plan": "not an array"})),
        event(2, EventType::ToolCallRequested, json!({"call": {"method": 7}})),
        event(3, EventType::RunFailed, json!({})),
    ];

    let digest = summarize_run(&run, &events);
    assert_eq!(digest.steps_planned, 0);
    assert!(digest.tools_used.is_empty());
    assert_eq!(digest.outcome, Some(RunOutcome::Error));
    assert!(digest.last_failure_reason.is_none());
}
