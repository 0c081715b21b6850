// crates/nexus-router-dispatch/tests/subprocess_adapter.rs
// ============================================================================
// Module: Subprocess Adapter Tests
// Description: Drives the echo-tool fixture through the wire contract.
// Purpose: Validate the operational failure taxonomy and adapter identity.
// ============================================================================
//! ## Overview
//! Integration tests against the `nexus-echo-tool` fixture binary: success
//! echo, non-zero exit, wall-clock timeout, invalid and non-object JSON
//! output, missing binaries, environment merging, and deterministic adapter
//! identifier derivation (including a pinned digest vector).

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

use std::time::Duration;
use std::time::Instant;

use nexus_router_core::DispatchAdapter;
use nexus_router_core::DispatchError;
use nexus_router_dispatch::ERROR_CODE_COMMAND_NOT_FOUND;
use nexus_router_dispatch::ERROR_CODE_INVALID_JSON_OUTPUT;
use nexus_router_dispatch::ERROR_CODE_NONZERO_EXIT;
use nexus_router_dispatch::ERROR_CODE_TIMEOUT;
use nexus_router_dispatch::SubprocessAdapter;
use nexus_router_dispatch::SubprocessAdapterConfig;
use nexus_router_dispatch::derive_adapter_id;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn echo_tool_cmd() -> Vec<String> {
    vec![env!("CARGO_BIN_EXE_nexus-echo-tool").to_string()]
}

fn echo_adapter() -> SubprocessAdapter {
    SubprocessAdapter::new(SubprocessAdapterConfig::for_command(echo_tool_cmd()))
        .expect("build adapter")
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn expect_operational(error: &DispatchError, code: &str) {
    assert!(error.is_operational(), "expected operational error, got {error}");
    assert_eq!(error.code(), code);
}

// ============================================================================
// SECTION: Success Path
// ============================================================================

#[test]
fn echo_tool_round_trips_the_payload() {
    let adapter = echo_adapter();
    let call_args = args(json!({"input": "ok", "count": 2}));

    let output = adapter.call("demo-tool", "echo", &call_args).expect("echo succeeds");
    assert_eq!(output.get("success"), Some(&Value::Bool(true)));
    assert_eq!(output.get("tool"), Some(&json!("demo-tool")));
    assert_eq!(output.get("method"), Some(&json!("echo")));
    assert_eq!(output.get("received_args"), Some(&json!({"input": "ok", "count": 2})));
}

#[test]
fn stderr_noise_does_not_affect_success() {
    let adapter = echo_adapter();
    let call_args = args(json!({"simulate_stderr": "warning: something"}));

    let output = adapter.call("t", "m", &call_args).expect("succeeds despite stderr");
    assert_eq!(output.get("success"), Some(&Value::Bool(true)));
}

// ============================================================================
// SECTION: Failure Taxonomy
// ============================================================================

#[test]
fn nonzero_exit_maps_to_operational_error() {
    let adapter = echo_adapter();
    let call_args = args(json!({"simulate_exit_code": 3, "stderr_message": "boom"}));

    let error = adapter.call("t", "m", &call_args).expect_err("must fail");
    expect_operational(&error, ERROR_CODE_NONZERO_EXIT);
    assert!(error.message().contains("exited with code 3"));
    assert!(error.message().contains("boom"));
}

#[test]
fn timeout_kills_the_child_and_maps_to_operational_error() {
    let config = SubprocessAdapterConfig::for_command(echo_tool_cmd())
        .with_timeout(Duration::from_millis(500));
    let adapter = SubprocessAdapter::new(config).expect("build adapter");
    let call_args = args(json!({"simulate_timeout": true}));

    let started = Instant::now();
    let error = adapter.call("t", "m", &call_args).expect_err("must time out");
    expect_operational(&error, ERROR_CODE_TIMEOUT);
    // The child sleeps for an hour; returning quickly proves the kill.
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn invalid_json_output_maps_to_operational_error() {
    let adapter = echo_adapter();
    let call_args = args(json!({"simulate_invalid_json": true}));

    let error = adapter.call("t", "m", &call_args).expect_err("must fail");
    expect_operational(&error, ERROR_CODE_INVALID_JSON_OUTPUT);
}

#[test]
fn non_object_json_output_maps_to_operational_error() {
    let adapter = echo_adapter();
    let call_args = args(json!({"simulate_non_object": true}));

    let error = adapter.call("t", "m", &call_args).expect_err("must fail");
    expect_operational(&error, ERROR_CODE_INVALID_JSON_OUTPUT);
    assert!(error.message().contains("not a JSON object"));
}

#[test]
fn missing_binary_maps_to_command_not_found() {
    let config = SubprocessAdapterConfig::for_command(vec![
        "/nonexistent/nexus-tool-binary".to_string(),
    ]);
    let adapter = SubprocessAdapter::new(config).expect("build adapter");

    let error = adapter.call("t", "m", &Map::new()).expect_err("must fail");
    expect_operational(&error, ERROR_CODE_COMMAND_NOT_FOUND);
}

#[test]
fn empty_base_command_is_rejected_at_construction() {
    assert!(SubprocessAdapter::new(SubprocessAdapterConfig::for_command(Vec::new())).is_err());
}

// ============================================================================
// SECTION: Environment and Identity
// ============================================================================

#[test]
fn configured_env_merges_over_ambient_environment() {
    let mut config = SubprocessAdapterConfig::for_command(echo_tool_cmd());
    config.env = Some(
        [("NEXUS_TEST_MARKER".to_string(), "set".to_string())].into_iter().collect(),
    );
    let adapter = SubprocessAdapter::new(config).expect("build adapter");

    // The fixture ignores the variable; this verifies the merged
    // environment does not break spawning or the wire contract.
    let output = adapter.call("t", "m", &Map::new()).expect("call succeeds");
    assert_eq!(output.get("success"), Some(&Value::Bool(true)));
}

#[test]
fn derived_adapter_id_is_stable_and_pinned() {
    let base_cmd =
        vec!["python".to_string(), "-m".to_string(), "mcpt.cli".to_string()];
    // sha256("python -m mcpt.cli") starts with c63a78.
    assert_eq!(derive_adapter_id(&base_cmd), "subprocess:python:c63a78");

    // Same command, same identifier, across adapter instances.
    let first = SubprocessAdapter::new(SubprocessAdapterConfig::for_command(base_cmd.clone()))
        .expect("first adapter");
    let second = SubprocessAdapter::new(SubprocessAdapterConfig::for_command(base_cmd))
        .expect("second adapter");
    assert_eq!(first.adapter_id(), second.adapter_id());
}

#[test]
fn derived_adapter_id_uses_program_basename() {
    let base_cmd = vec!["/usr/local/bin/echo".to_string()];
    let id = derive_adapter_id(&base_cmd);
    assert!(id.starts_with("subprocess:echo:"), "unexpected id: {id}");
}

#[test]
fn caller_supplied_adapter_id_wins() {
    let mut config = SubprocessAdapterConfig::for_command(echo_tool_cmd());
    config.adapter_id = Some("custom-adapter".to_string());
    let adapter = SubprocessAdapter::new(config).expect("build adapter");
    assert_eq!(adapter.adapter_id(), "custom-adapter");
}
