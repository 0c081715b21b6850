// crates/nexus-router-contract/src/tools.rs
// ============================================================================
// Module: Public Tool Entry Points
// Description: Validated run, inspect, and replay operations.
// Purpose: Bind the core runtime to SQLite storage behind the tool surface.
// Dependencies: nexus-router-core, nexus-router-store-sqlite, serde,
//               serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each entry point validates the raw request against its schema, opens the
//! store named by `db_path`, and delegates to the core runtime. Validation
//! failures are raised before a run is created; nothing is persisted for a
//! rejected request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nexus_router_core::DispatchAdapter;
use nexus_router_core::EventStore;
use nexus_router_core::InspectReport;
use nexus_router_core::ReplayReport;
use nexus_router_core::Router;
use nexus_router_core::RunFilter;
use nexus_router_core::RunId;
use nexus_router_core::RunRequest;
use nexus_router_core::RunResponse;
use nexus_router_core::RunStatus;
use nexus_router_core::StoreError;
use nexus_router_core::Timestamp;
use nexus_router_core::runtime::inspect::summarize_run;
use nexus_router_core::runtime::replay::replay_run;
use nexus_router_core::runtime::replay::run_not_found;
use nexus_router_core::telemetry::MetricsSink;
use nexus_router_store_sqlite::SqliteEventStore;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::tooling::ToolName;
use crate::tooling::validate_request;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Public tool errors.
///
/// # Invariants
/// - `Validation` precedes any storage access; rejected requests persist
///   nothing.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The request does not match its schema.
    #[error("request validation failed: {0}")]
    Validation(String),
    /// The request passed the schema but could not be decoded.
    #[error("invalid request payload: {0}")]
    Request(String),
    /// An embedded schema is unparseable or invalid (packaging defect).
    #[error("tool schema error: {0}")]
    Schema(String),
    /// Storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Request Shapes
// ============================================================================

/// Validated inspect request.
///
/// # Invariants
/// - Defaults mirror the schema: `limit` 50, `offset` 0.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InspectRequest {
    /// Path to the event store database.
    pub db_path: String,
    /// Restrict to a single run.
    #[serde(default)]
    pub run_id: Option<RunId>,
    /// Restrict to runs with this status.
    #[serde(default)]
    pub status: Option<RunStatus>,
    /// Maximum runs to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Pagination offset.
    #[serde(default)]
    pub offset: u64,
    /// Restrict to runs created at or after this timestamp.
    #[serde(default)]
    pub since: Option<Timestamp>,
}

/// Returns the default inspect page size.
const fn default_limit() -> u64 {
    50
}

/// Validated replay request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplayRequest {
    /// Path to the event store database.
    pub db_path: String,
    /// Run to replay.
    pub run_id: RunId,
    /// Whether violations make the result not ok.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

/// Returns the default strictness for replay.
const fn default_strict() -> bool {
    true
}

// ============================================================================
// SECTION: Tool Entry Points
// ============================================================================

/// Executes a `nexus-router.run` request.
///
/// The store at `db_path` is created on first use; pass `":memory:"` for an
/// ephemeral run. The adapter executes apply-mode tool calls; dry runs
/// never invoke it.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] for schema-invalid requests (nothing
/// is persisted) and [`ToolError::Store`] for storage failures.
pub fn run(
    request: &Value,
    db_path: &str,
    adapter: &dyn DispatchAdapter,
) -> Result<RunResponse, ToolError> {
    run_with_metrics(request, db_path, adapter, None)
}

/// Executes a `nexus-router.run` request, reporting outcomes to a sink.
///
/// # Errors
///
/// Returns the same errors as [`run`].
pub fn run_with_metrics(
    request: &Value,
    db_path: &str,
    adapter: &dyn DispatchAdapter,
    metrics: Option<&dyn MetricsSink>,
) -> Result<RunResponse, ToolError> {
    validate_request(ToolName::Run, request)?;
    let request: RunRequest = serde_json::from_value(request.clone())
        .map_err(|err| ToolError::Request(err.to_string()))?;

    let store = open_store(db_path)?;
    let response = match metrics {
        Some(sink) => Router::with_metrics(&store, adapter, sink).run(&request)?,
        None => Router::new(&store, adapter).run(&request)?,
    };
    close_store(store)?;
    Ok(response)
}

/// Executes a `nexus-router.inspect` request.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] for schema-invalid requests and
/// [`ToolError::Store`] for storage failures.
pub fn inspect(request: &Value) -> Result<InspectReport, ToolError> {
    validate_request(ToolName::Inspect, request)?;
    let request: InspectRequest = serde_json::from_value(request.clone())
        .map_err(|err| ToolError::Request(err.to_string()))?;

    let filter = RunFilter {
        run_id: request.run_id.clone(),
        status: request.status,
        since: request.since.clone(),
    };
    let store = open_store(&request.db_path)?;
    let summary = store.count_runs(&filter)?;
    let records = store.list_runs(&filter, request.limit, request.offset)?;
    let mut runs = Vec::with_capacity(records.len());
    for record in records {
        let events = store.read_events(&record.run_id)?;
        runs.push(summarize_run(&record, &events));
    }
    close_store(store)?;
    Ok(InspectReport {
        summary,
        runs,
    })
}

/// Executes a `nexus-router.replay` request.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] for schema-invalid requests and
/// [`ToolError::Store`] for storage failures. An unknown run is not an
/// error; it yields a report with the `RUN_NOT_FOUND` violation.
pub fn replay(request: &Value) -> Result<ReplayReport, ToolError> {
    validate_request(ToolName::Replay, request)?;
    let request: ReplayRequest = serde_json::from_value(request.clone())
        .map_err(|err| ToolError::Request(err.to_string()))?;

    let store = open_store(&request.db_path)?;
    let report = match store.get_run(&request.run_id)? {
        None => run_not_found(&request.run_id),
        Some(record) => {
            let events = store.read_events(&record.run_id)?;
            replay_run(&record, &events, request.strict)
        }
    };
    close_store(store)?;
    Ok(report)
}

// ============================================================================
// SECTION: Store Helpers
// ============================================================================

/// Opens the store named by a request's `db_path`.
fn open_store(db_path: &str) -> Result<SqliteEventStore, ToolError> {
    SqliteEventStore::open_path(db_path)
        .map_err(|err| ToolError::Store(StoreError::from(err)))
}

/// Closes a store, surfacing close-time failures.
fn close_store(store: SqliteEventStore) -> Result<(), ToolError> {
    store.close().map_err(|err| ToolError::Store(StoreError::from(err)))
}
