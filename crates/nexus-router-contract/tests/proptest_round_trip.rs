// crates/nexus-router-contract/tests/proptest_round_trip.rs
// ============================================================================
// Module: Round-Trip Property Tests
// Description: Random plans through the router agree with the event log.
// ============================================================================
//! ## Overview
//! Property-based checks over random plans executed through the public run
//! tool with a scripted fake adapter:
//! - `seq` values are dense from 0 in read order
//! - exactly one terminal event exists, it is last, and the run status
//!   agrees with it
//! - each executed step has its complete ordered event subsequence
//! - replay returns ok with no violations for router-produced runs
//! - the response and the persisted events agree on per-step statuses and
//!   on the applied/skipped counts

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
    clippy::cast_possible_truncation,
    reason = "Test-only assertions and helpers are permitted."
)]

use nexus_router_core::EventStore;
use nexus_router_core::EventType;
use nexus_router_core::RunStatus;
use nexus_router_core::core::request::RunOutcome;
use nexus_router_core::core::request::StepStatus;
use nexus_router_dispatch::FakeAdapter;
use nexus_router_store_sqlite::SqliteEventStore;
use proptest::collection::vec;
use proptest::prelude::ProptestConfig;
use proptest::prelude::prop;
use proptest::prop_assert;
use proptest::prop_assert_eq;
use proptest::proptest;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the scripted adapter: steps with `{"fail": true}` args fail
/// operationally, everything else echoes.
fn scripted_adapter() -> FakeAdapter {
    let adapter = FakeAdapter::new();
    adapter.set_default_response_fn(|tool, method, args| {
        if args.get("fail") == Some(&Value::Bool(true)) {
            return Err(nexus_router_core::DispatchError::operational(
                "TOOL_ERROR",
                "scripted failure",
            ));
        }
        let mut output = serde_json::Map::new();
        output.insert("tool".to_string(), Value::String(tool.to_string()));
        output.insert("method".to_string(), Value::String(method.to_string()));
        output.insert("echoed".to_string(), Value::Bool(true));
        Ok(output)
    });
    adapter
}

/// Builds a run request over the generated failure pattern.
fn request_for(failures: &[bool], apply: bool) -> Value {
    let steps: Vec<Value> = failures
        .iter()
        .enumerate()
        .map(|(index, fail)| {
            json!({
                "step_id": format!("s{index}"),
                "intent": format!("step {index}"),
                "call": {"tool": "fake", "method": format!("m{}", index % 3), "args": {"fail": fail}},
            })
        })
        .collect();
    json!({
        "goal": "property",
        "mode": if apply { "apply" } else { "dry_run" },
        "policy": {"allow_apply": true},
        "plan_override": steps,
    })
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn router_runs_agree_with_their_event_logs(
        failures in vec(prop::bool::ANY, 0..6),
        apply in prop::bool::ANY,
    ) {
        let dir = TempDir::new().expect("temp dir");
        let db_path = dir.path().join("prop.db");
        let db_path = db_path.to_str().expect("utf8 path");
        let adapter = scripted_adapter();

        let response = nexus_router_contract::run(
            &request_for(&failures, apply),
            db_path,
            &adapter,
        )
        .expect("run succeeds");

        // Operational failures never fail the run.
        prop_assert_eq!(response.summary.outcome, RunOutcome::Ok);
        prop_assert_eq!(response.results.len(), failures.len());

        let failed_steps = if apply {
            failures.iter().filter(|fail| **fail).count() as u64
        } else {
            0
        };
        let ok_steps = failures.len() as u64 - failed_steps;
        prop_assert_eq!(response.summary.outputs_skipped, failed_steps);
        prop_assert_eq!(
            response.summary.outputs_applied,
            if apply { ok_steps } else { 0 }
        );

        // Inv 1: seq dense from 0 in read order.
        let store = SqliteEventStore::open_path(db_path).expect("open store");
        let events = store.read_events(&response.run.run_id).expect("read events");
        for (index, event) in events.iter().enumerate() {
            prop_assert_eq!(event.seq, index as u64);
        }

        // Inv 2: exactly one terminal event, last, agreeing with status.
        let terminal_count =
            events.iter().filter(|event| event.event_type.is_terminal()).count();
        prop_assert_eq!(terminal_count, 1);
        prop_assert_eq!(
            events.last().map(|event| event.event_type),
            Some(EventType::RunCompleted)
        );
        let record =
            store.get_run(&response.run.run_id).expect("get run").expect("run exists");
        prop_assert_eq!(record.status, RunStatus::Completed);

        // Inv 3: per-step complete ordered subsequence.
        for (index, result) in response.results.iter().enumerate() {
            let step_id = format!("s{index}");
            let of_step: Vec<EventType> = events
                .iter()
                .filter(|event| {
                    event.payload.get("step_id").and_then(Value::as_str)
                        == Some(step_id.as_str())
                })
                .map(|event| event.event_type)
                .collect();
            let expected_result_event = if result.status == StepStatus::Ok {
                EventType::ToolCallSucceeded
            } else {
                EventType::ToolCallFailed
            };
            prop_assert_eq!(of_step, vec![
                EventType::StepStarted,
                EventType::ToolCallRequested,
                expected_result_event,
                EventType::StepCompleted,
            ]);
        }

        // Inv 6: response statuses agree with the recorded events.
        for result in &response.results {
            if apply {
                let failed = result.status == StepStatus::Error;
                let arg_failed = failures[result
                    .step_id
                    .as_str()
                    .trim_start_matches('s')
                    .parse::<usize>()
                    .expect("step index")];
                prop_assert_eq!(failed, arg_failed);
            } else {
                prop_assert_eq!(result.status, StepStatus::Ok);
                prop_assert_eq!(result.simulated, Some(true));
            }
        }

        // Inv 4: router-produced runs replay clean and strict.
        let report = nexus_router_contract::replay(&json!({
            "db_path": db_path,
            "run_id": response.run.run_id.as_str(),
        }))
        .expect("replay succeeds");
        prop_assert!(report.ok);
        prop_assert!(report.violations.is_empty());
        let view = report.run_view.expect("run view");
        prop_assert!(view.provenance_present);
        prop_assert_eq!(view.steps.len(), failures.len());
    }
}
