// crates/nexus-router-dispatch/src/bin/echo_tool.rs
// ============================================================================
// Module: Echo Tool Fixture
// Description: Minimal external tool for exercising the subprocess adapter.
// Purpose: Simulate success and failure scenarios driven by call arguments.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! A minimal tool implementation speaking the subprocess wire contract:
//! `nexus-echo-tool call <tool> <method> --json-args-file <path>`. Behavior
//! is controlled by keys in the payload's `args` object:
//!
//! - `simulate_timeout`: sleep far longer than any reasonable timeout
//! - `simulate_timeout_seconds`: override the sleep duration
//! - `simulate_exit_code`: exit with the given code
//! - `simulate_invalid_json`: print non-JSON output and exit 0
//! - `simulate_non_object`: print a JSON array and exit 0
//! - `simulate_stderr`: write the given text to stderr (still succeed)
//!
//! Anything else echoes the payload back as a JSON object on stdout.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "The wire contract is stdout/stderr; this binary is the tool."
)]

use std::env;
use std::fs;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;

/// Default sleep used by `simulate_timeout`.
const DEFAULT_TIMEOUT_SLEEP_SECS: u64 = 3_600;

/// Parsed command line for one invocation.
struct CallArgs {
    /// Tool identifier from the command line.
    tool: String,
    /// Method name from the command line.
    method: String,
    /// Path to the JSON args file.
    args_file: String,
}

/// Parses `call <tool> <method> --json-args-file <path>`.
fn parse_args(argv: &[String]) -> Option<CallArgs> {
    let [command, tool, method, flag, args_file] = argv else {
        return None;
    };
    if command != "call" || flag != "--json-args-file" {
        return None;
    }
    Some(CallArgs {
        tool: tool.clone(),
        method: method.clone(),
        args_file: args_file.clone(),
    })
}

/// Fixture entry point returning the simulated exit code.
fn main() -> ExitCode {
    let argv: Vec<String> = env::args().skip(1).collect();
    let Some(call) = parse_args(&argv) else {
        println!("{}", json!({"error": "usage: call <tool> <method> --json-args-file <path>"}));
        return ExitCode::FAILURE;
    };

    let payload: Value = match fs::read_to_string(&call.args_file) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                println!("{}", json!({"error": format!("failed to parse args file: {err}")}));
                return ExitCode::FAILURE;
            }
        },
        Err(err) => {
            println!("{}", json!({"error": format!("failed to read args file: {err}")}));
            return ExitCode::FAILURE;
        }
    };
    let tool_args = payload.get("args").cloned().unwrap_or_else(|| json!({}));

    if tool_args.get("simulate_timeout").and_then(Value::as_bool) == Some(true) {
        let seconds = tool_args
            .get("simulate_timeout_seconds")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_TIMEOUT_SLEEP_SECS);
        thread::sleep(Duration::from_secs(seconds));
        return ExitCode::SUCCESS;
    }

    if let Some(exit_code) = tool_args.get("simulate_exit_code").and_then(Value::as_u64) {
        let stderr_message = tool_args
            .get("stderr_message")
            .and_then(Value::as_str)
            .unwrap_or("simulated error");
        eprintln!("{stderr_message}");
        return ExitCode::from(u8::try_from(exit_code).unwrap_or(1));
    }

    if tool_args.get("simulate_invalid_json").and_then(Value::as_bool) == Some(true) {
        println!("This is not valid JSON {{{{");
        return ExitCode::SUCCESS;
    }

    if tool_args.get("simulate_non_object").and_then(Value::as_bool) == Some(true) {
        println!("{}", json!([1, 2, 3]));
        return ExitCode::SUCCESS;
    }

    if let Some(text) = tool_args.get("simulate_stderr").and_then(Value::as_str) {
        eprintln!("{text}");
    }

    let result = json!({
        "success": true,
        "tool": call.tool,
        "method": call.method,
        "received_args": tool_args,
        "echo": true,
    });
    println!("{result}");
    ExitCode::SUCCESS
}
