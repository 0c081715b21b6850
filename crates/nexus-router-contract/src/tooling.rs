// crates/nexus-router-contract/src/tooling.rs
// ============================================================================
// Module: Tooling Contracts
// Description: Tool names, embedded schemas, and lazy validators.
// Purpose: Pin the public tool surface and validate at the trust boundary.
// Dependencies: jsonschema, serde, serde_json
// ============================================================================

//! ## Overview
//! Each public tool pairs a stable identifier with versioned request and
//! response schemas embedded into the binary. Validators compile lazily and
//! are cached for the process lifetime. Schemas evolve additively only
//! within `v0.x`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::OnceLock;

use jsonschema::Validator;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::tools::ToolError;

// ============================================================================
// SECTION: Embedded Schemas
// ============================================================================

/// Run request schema source (v0.1).
const RUN_REQUEST_SCHEMA: &str = include_str!("../schemas/nexus-router.run.request.v0.1.json");
/// Run response schema source (v0.1).
const RUN_RESPONSE_SCHEMA: &str = include_str!("../schemas/nexus-router.run.response.v0.1.json");
/// Inspect request schema source (v0.2).
const INSPECT_REQUEST_SCHEMA: &str =
    include_str!("../schemas/nexus-router.inspect.request.v0.2.json");
/// Inspect response schema source (v0.2).
const INSPECT_RESPONSE_SCHEMA: &str =
    include_str!("../schemas/nexus-router.inspect.response.v0.2.json");
/// Replay request schema source (v0.2).
const REPLAY_REQUEST_SCHEMA: &str =
    include_str!("../schemas/nexus-router.replay.request.v0.2.json");
/// Replay response schema source (v0.2).
const REPLAY_RESPONSE_SCHEMA: &str =
    include_str!("../schemas/nexus-router.replay.response.v0.2.json");

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool identifiers exposed by the library.
///
/// # Invariants
/// - Wire names are stable; the set only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Execute a run request.
    Run,
    /// Summarize runs in an event store.
    Inspect,
    /// Replay one run and check invariants.
    Replay,
}

impl ToolName {
    /// Returns the stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Run => "nexus-router.run",
            Self::Inspect => "nexus-router.inspect",
            Self::Replay => "nexus-router.replay",
        }
    }

    /// Returns the request schema version for this tool.
    #[must_use]
    pub const fn schema_version(self) -> &'static str {
        match self {
            Self::Run => "v0.1",
            Self::Inspect | Self::Replay => "v0.2",
        }
    }
}

/// Tool definition pairing a name with its schemas.
///
/// # Invariants
/// - `request_schema` and `response_schema` are JSON Schema payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for the tool request payload.
    pub request_schema: Value,
    /// JSON schema for the tool response payload.
    pub response_schema: Value,
}

/// Builds the definitions of all public tools.
///
/// # Errors
///
/// Returns [`ToolError::Schema`] when an embedded schema fails to parse,
/// which indicates a packaging defect.
pub fn tool_definitions() -> Result<Vec<ToolDefinition>, ToolError> {
    Ok(vec![
        ToolDefinition {
            name: ToolName::Run,
            description: "Execute a tool-call plan through the router, appending an \
                          auditable event log."
                .to_string(),
            request_schema: parse_schema(RUN_REQUEST_SCHEMA)?,
            response_schema: parse_schema(RUN_RESPONSE_SCHEMA)?,
        },
        ToolDefinition {
            name: ToolName::Inspect,
            description: "Summarize runs in an event store with filtering and pagination."
                .to_string(),
            request_schema: parse_schema(INSPECT_REQUEST_SCHEMA)?,
            response_schema: parse_schema(INSPECT_RESPONSE_SCHEMA)?,
        },
        ToolDefinition {
            name: ToolName::Replay,
            description: "Reconstruct one run from its events and check structural \
                          invariants."
                .to_string(),
            request_schema: parse_schema(REPLAY_REQUEST_SCHEMA)?,
            response_schema: parse_schema(REPLAY_RESPONSE_SCHEMA)?,
        },
    ])
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Cached validator for the run request schema.
static RUN_REQUEST_VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
/// Cached validator for the inspect request schema.
static INSPECT_REQUEST_VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
/// Cached validator for the replay request schema.
static REPLAY_REQUEST_VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Validates a raw request against a tool's request schema.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] when the request does not match the
/// schema and [`ToolError::Schema`] when the embedded schema itself is
/// broken.
pub fn validate_request(tool: ToolName, request: &Value) -> Result<(), ToolError> {
    let (cache, source) = match tool {
        ToolName::Run => (&RUN_REQUEST_VALIDATOR, RUN_REQUEST_SCHEMA),
        ToolName::Inspect => (&INSPECT_REQUEST_VALIDATOR, INSPECT_REQUEST_SCHEMA),
        ToolName::Replay => (&REPLAY_REQUEST_VALIDATOR, REPLAY_REQUEST_SCHEMA),
    };
    let validator = cache
        .get_or_init(|| compile_validator(source))
        .as_ref()
        .map_err(|message| ToolError::Schema(message.clone()))?;
    validator
        .validate(request)
        .map_err(|err| ToolError::Validation(format!("{}: {err}", tool.as_str())))
}

/// Parses one embedded schema source.
fn parse_schema(source: &str) -> Result<Value, ToolError> {
    serde_json::from_str(source)
        .map_err(|err| ToolError::Schema(format!("embedded schema unparseable: {err}")))
}

/// Compiles one embedded schema into a validator.
fn compile_validator(source: &str) -> Result<Validator, String> {
    let schema: Value = serde_json::from_str(source)
        .map_err(|err| format!("embedded schema unparseable: {err}"))?;
    jsonschema::validator_for(&schema).map_err(|err| format!("embedded schema invalid: {err}"))
}
