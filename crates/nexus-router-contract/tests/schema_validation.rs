// crates/nexus-router-contract/tests/schema_validation.rs
// ============================================================================
// Module: Schema Validation Tests
// Description: Verifies requests are rejected before anything persists.
// ============================================================================
//! ## Overview
//! Schema-invalid requests must be raised to the caller before a run is
//! created; these tests confirm the rejection and that no database file is
//! even created for a rejected run request.

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

use nexus_router_contract::ToolError;
use nexus_router_contract::ToolName;
use nexus_router_contract::tool_definitions;
use nexus_router_dispatch::NullAdapter;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn run_request_missing_goal_is_rejected_and_persists_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("never-created.db");
    let adapter = NullAdapter::new();

    let request = json!({"mode": "dry_run"});
    let error = nexus_router_contract::run(
        &request,
        db_path.to_str().expect("utf8 path"),
        &adapter,
    )
    .expect_err("must reject");

    assert!(matches!(error, ToolError::Validation(_)));
    assert!(!db_path.exists(), "rejected request must not touch storage");
}

#[test]
fn run_request_with_unknown_mode_is_rejected() {
    let adapter = NullAdapter::new();
    let request = json!({"goal": "g", "mode": "yolo"});
    let error =
        nexus_router_contract::run(&request, ":memory:", &adapter).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn run_request_with_malformed_step_is_rejected() {
    let adapter = NullAdapter::new();
    let request = json!({
        "goal": "g",
        "mode": "dry_run",
        "plan_override": [{"step_id": "s1", "call": {"tool": "t", "method": "m"}}],
    });
    let error =
        nexus_router_contract::run(&request, ":memory:", &adapter).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn inspect_request_requires_db_path() {
    let error = nexus_router_contract::inspect(&json!({})).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn inspect_request_rejects_oversized_limit() {
    let request = json!({"db_path": ":memory:", "limit": 10_001});
    let error = nexus_router_contract::inspect(&request).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn inspect_request_rejects_negative_offset() {
    let request = json!({"db_path": ":memory:", "offset": -1});
    let error = nexus_router_contract::inspect(&request).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn replay_request_requires_run_id() {
    let error =
        nexus_router_contract::replay(&json!({"db_path": ":memory:"})).expect_err("must reject");
    assert!(matches!(error, ToolError::Validation(_)));
}

#[test]
fn tool_definitions_expose_the_three_public_ids() {
    let definitions = tool_definitions().expect("definitions parse");
    let names: Vec<&str> =
        definitions.iter().map(|definition| definition.name.as_str()).collect();
    assert_eq!(names, vec!["nexus-router.run", "nexus-router.inspect", "nexus-router.replay"]);
    assert_eq!(ToolName::Run.schema_version(), "v0.1");
    assert_eq!(ToolName::Inspect.schema_version(), "v0.2");
    assert_eq!(ToolName::Replay.schema_version(), "v0.2");
    for definition in &definitions {
        assert!(definition.request_schema.is_object());
        assert!(definition.response_schema.is_object());
    }
}
