// crates/nexus-router-core/src/interfaces/mod.rs
// ============================================================================
// Module: Nexus Router Interfaces
// Description: Backend-agnostic interfaces for storage and dispatch.
// Purpose: Define the contract surfaces used by the Nexus Router runtime.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the router integrates with storage and tool
//! transports without embedding backend-specific details. Store failures are
//! infrastructure failures and abort a run; dispatch failures are classified
//! into the two-class taxonomy the router's error model is built on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::event::EventRecord;
use crate::core::event::EventType;
use crate::core::identifiers::EventId;
use crate::core::identifiers::RunId;
use crate::core::run::RunCounts;
use crate::core::run::RunFilter;
use crate::core::run::RunMode;
use crate::core::run::RunRecord;
use crate::core::run::RunStatus;

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Maximum page size accepted by [`EventStore::list_runs`].
pub const MAX_LIST_LIMIT: u64 = 10_000;

/// Event store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Every failing operation leaves the store unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage I/O error; infrastructure failure, treated as a bug upstream.
    #[error("event store io error: {0}")]
    Io(String),
    /// The referenced run does not exist.
    #[error("run not found: {0}")]
    RunNotFound(String),
    /// Attempted transition away from a terminal run status.
    #[error("invalid run status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current persisted status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },
    /// Invalid argument or stored data.
    #[error("event store invalid data: {0}")]
    Invalid(String),
    /// Stored data failed an integrity check.
    #[error("event store corruption: {0}")]
    Corrupt(String),
    /// Backing store reported an error.
    #[error("event store error: {0}")]
    Store(String),
}

/// Append-only event store with per-run sequencing.
///
/// Implementations must serialize `(run_id, seq)` allocation per run; they
/// need not serialize across different runs.
pub trait EventStore {
    /// Creates a run with status RUNNING and returns its fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the run cannot be persisted.
    fn create_run(&self, mode: RunMode, goal: &str) -> Result<RunId, StoreError>;

    /// Atomically appends an event at the next dense `seq` for the run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RunNotFound`] for unknown runs and
    /// [`StoreError`] when persistence fails.
    fn append(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: &Value,
    ) -> Result<EventId, StoreError>;

    /// Transitions a run from RUNNING to a terminal status.
    ///
    /// Repeating the same terminal status is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidTransition`] when moving away from a
    /// terminal status and [`StoreError::RunNotFound`] for unknown runs.
    fn set_run_status(&self, run_id: &RunId, status: RunStatus) -> Result<(), StoreError>;

    /// Loads a single run record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn get_run(&self, run_id: &RunId) -> Result<Option<RunRecord>, StoreError>;

    /// Lists runs ordered by `created_at` descending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when `limit` exceeds
    /// [`MAX_LIST_LIMIT`] and [`StoreError`] when the query fails.
    fn list_runs(
        &self,
        filter: &RunFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<RunRecord>, StoreError>;

    /// Counts runs by status under the same filter predicate as listing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_runs(&self, filter: &RunFilter) -> Result<RunCounts, StoreError>;

    /// Reads all events of a run in ascending `seq` order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails. An unknown run yields an
    /// empty sequence, matching the relational semantics of the log table.
    fn read_events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, StoreError>;
}

// ============================================================================
// SECTION: Dispatch Adapter
// ============================================================================

/// Error code the router records when an adapter failure is a defect.
pub const ADAPTER_BUG_CODE: &str = "ADAPTER_BUG";

/// Stable identifier of the null adapter.
pub const NULL_ADAPTER_ID: &str = "null";

/// Dispatch errors in the two-class taxonomy.
///
/// # Invariants
/// - `Operational` failures are expected and recoverable within a run.
/// - `Bug` failures abort the run; anything an adapter surfaces outside this
///   type collapses into `Bug` at the router boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Expected failure attributable to the tool, transport, or inputs.
    #[error("operational dispatch failure [{code}]: {message}")]
    Operational {
        /// Stable error code drawn from the adapter's closed set.
        code: String,
        /// Human-readable failure message.
        message: String,
    },
    /// Unexpected failure attributable to the adapter itself.
    #[error("adapter bug [{code}]: {message}")]
    Bug {
        /// Stable error code for the defect class.
        code: String,
        /// Human-readable failure message.
        message: String,
    },
}

impl DispatchError {
    /// Builds an operational error.
    #[must_use]
    pub fn operational(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operational {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Builds a bug error.
    #[must_use]
    pub fn bug(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bug {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Operational {
                code, ..
            }
            | Self::Bug {
                code, ..
            } => code,
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Operational {
                message, ..
            }
            | Self::Bug {
                message, ..
            } => message,
        }
    }

    /// Returns true for the operational class.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self, Self::Operational { .. })
    }
}

/// Transport capability executing one tool call.
///
/// The router decides what to call; the adapter decides how to call it.
pub trait DispatchAdapter {
    /// Returns the stable identifier of this adapter instance.
    fn adapter_id(&self) -> &str;

    /// Executes a tool call and returns a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Operational`] for expected failures and
    /// [`DispatchError::Bug`] for adapter defects.
    fn call(
        &self,
        tool: &str,
        method: &str,
        args: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DispatchError>;
}

/// Builds the deterministic placeholder object used for simulated calls.
///
/// Dry-run execution and the null adapter both produce this shape, so a
/// simulated output is recognizable regardless of which path emitted it.
#[must_use]
pub fn simulated_output(tool: &str, method: &str, args: &Map<String, Value>) -> Map<String, Value> {
    let mut output = Map::new();
    output.insert("simulated".to_string(), Value::Bool(true));
    output.insert("tool".to_string(), Value::String(tool.to_string()));
    output.insert("method".to_string(), Value::String(method.to_string()));
    output.insert("args_echo".to_string(), Value::Object(args.clone()));
    output.insert("result".to_string(), Value::Null);
    output
}
