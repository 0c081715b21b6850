// crates/nexus-router-dispatch/src/fake.rs
// ============================================================================
// Module: Fake Adapter
// Description: Adapter with configurable responses for testing.
// Purpose: Let tests script exact outputs or errors per (tool, method).
// Dependencies: nexus-router-core, serde_json
// ============================================================================

//! ## Overview
//! The fake adapter plays back programmed responses: fixed objects,
//! functions of the arguments, or errors from either class of the dispatch
//! taxonomy. Unregistered calls fall through to an optional default
//! response, then to a recognizable `{"fake": true, ...}` placeholder.
//! Every call is recorded in an inspectable log.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use nexus_router_core::DispatchAdapter;
use nexus_router_core::DispatchError;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default error code for scripted operational failures.
pub const DEFAULT_OPERATIONAL_CODE: &str = "TOOL_ERROR";

// ============================================================================
// SECTION: Response Scripting
// ============================================================================

/// Response computed from call arguments.
type ComputeFn =
    dyn Fn(&Map<String, Value>) -> Result<Map<String, Value>, DispatchError> + Send + Sync;

/// Default response computed from the full call triple.
type DefaultComputeFn = dyn Fn(&str, &str, &Map<String, Value>) -> Result<Map<String, Value>, DispatchError>
    + Send
    + Sync;

/// Scripted response for one `(tool, method)` pair.
enum FakeResponse {
    /// Return this object.
    Fixed(Map<String, Value>),
    /// Compute the response from the arguments.
    Compute(Box<ComputeFn>),
    /// Fail with an operational error.
    Operational {
        /// Stable error code.
        code: String,
        /// Failure message.
        message: String,
    },
    /// Fail with a bug error.
    Bug {
        /// Stable error code.
        code: String,
        /// Failure message.
        message: String,
    },
}

/// Scripted default response for unregistered pairs.
enum DefaultResponse {
    /// Return this object.
    Fixed(Map<String, Value>),
    /// Compute the response from the call triple.
    Compute(Box<DefaultComputeFn>),
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLogEntry {
    /// Tool identifier of the call.
    pub tool: String,
    /// Method name of the call.
    pub method: String,
    /// Arguments object of the call.
    pub args: Map<String, Value>,
}

/// Mutable scripting state behind the adapter mutex.
#[derive(Default)]
struct FakeState {
    /// Scripted responses keyed by `(tool, method)`.
    responses: BTreeMap<(String, String), FakeResponse>,
    /// Default response for unregistered pairs.
    default_response: Option<DefaultResponse>,
    /// Log of all calls made to this adapter.
    call_log: Vec<CallLogEntry>,
}

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter with configurable responses and a call log.
///
/// # Invariants
/// - Scripting and the call log are serialized behind one mutex.
/// - Unregistered calls succeed with the `{"fake": true}` placeholder.
pub struct FakeAdapter {
    /// Adapter identifier reported to the router.
    adapter_id: String,
    /// Scripting state and call log.
    state: Mutex<FakeState>,
}

impl FakeAdapter {
    /// Creates a fake adapter with the default identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_adapter_id("fake")
    }

    /// Creates a fake adapter with a custom identifier.
    #[must_use]
    pub fn with_adapter_id(adapter_id: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Scripts a fixed object response for `(tool, method)`.
    pub fn set_response(&self, tool: &str, method: &str, response: Map<String, Value>) {
        self.state_mut().responses.insert(pair(tool, method), FakeResponse::Fixed(response));
    }

    /// Scripts a computed response for `(tool, method)`.
    pub fn set_response_fn<F>(&self, tool: &str, method: &str, response: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Map<String, Value>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.state_mut()
            .responses
            .insert(pair(tool, method), FakeResponse::Compute(Box::new(response)));
    }

    /// Scripts an operational failure for `(tool, method)`.
    pub fn set_operational_error(&self, tool: &str, method: &str, code: &str, message: &str) {
        self.state_mut().responses.insert(pair(tool, method), FakeResponse::Operational {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    /// Scripts a bug failure for `(tool, method)`.
    pub fn set_bug_error(&self, tool: &str, method: &str, code: &str, message: &str) {
        self.state_mut().responses.insert(pair(tool, method), FakeResponse::Bug {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    /// Scripts a fixed default response for unregistered pairs.
    pub fn set_default_response(&self, response: Map<String, Value>) {
        self.state_mut().default_response = Some(DefaultResponse::Fixed(response));
    }

    /// Scripts a computed default response for unregistered pairs.
    pub fn set_default_response_fn<F>(&self, response: F)
    where
        F: Fn(&str, &str, &Map<String, Value>) -> Result<Map<String, Value>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        self.state_mut().default_response = Some(DefaultResponse::Compute(Box::new(response)));
    }

    /// Returns a snapshot of all calls made so far.
    #[must_use]
    pub fn call_log(&self) -> Vec<CallLogEntry> {
        self.state_mut().call_log.clone()
    }

    /// Clears all scripted responses and the call log.
    pub fn reset(&self) {
        let mut state = self.state_mut();
        state.responses.clear();
        state.default_response = None;
        state.call_log.clear();
    }

    /// Locks the scripting state, recovering from poisoning.
    fn state_mut(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FakeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchAdapter for FakeAdapter {
    fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    fn call(
        &self,
        tool: &str,
        method: &str,
        args: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DispatchError> {
        let mut guard = self.state_mut();
        let state = &mut *guard;
        state.call_log.push(CallLogEntry {
            tool: tool.to_string(),
            method: method.to_string(),
            args: args.clone(),
        });

        if let Some(response) = state.responses.get(&pair(tool, method)) {
            return match response {
                FakeResponse::Fixed(object) => Ok(object.clone()),
                FakeResponse::Compute(compute) => compute(args),
                FakeResponse::Operational {
                    code,
                    message,
                } => Err(DispatchError::operational(code.clone(), message.clone())),
                FakeResponse::Bug {
                    code,
                    message,
                } => Err(DispatchError::bug(code.clone(), message.clone())),
            };
        }

        if let Some(default) = &state.default_response {
            return match default {
                DefaultResponse::Fixed(object) => Ok(object.clone()),
                DefaultResponse::Compute(compute) => compute(tool, method, args),
            };
        }

        Ok(fallthrough_placeholder(tool, method, args))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the `(tool, method)` lookup key.
fn pair(tool: &str, method: &str) -> (String, String) {
    (tool.to_string(), method.to_string())
}

/// Placeholder returned when nothing is scripted.
fn fallthrough_placeholder(
    tool: &str,
    method: &str,
    args: &Map<String, Value>,
) -> Map<String, Value> {
    let mut output = Map::new();
    output.insert("fake".to_string(), Value::Bool(true));
    output.insert("tool".to_string(), Value::String(tool.to_string()));
    output.insert("method".to_string(), Value::String(method.to_string()));
    output.insert("args_echo".to_string(), Value::Object(args.clone()));
    output.insert("result".to_string(), Value::Null);
    output
}
