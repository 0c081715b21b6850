// crates/nexus-router-dispatch/src/null.rs
// ============================================================================
// Module: Null Adapter
// Description: Adapter returning deterministic placeholder outputs.
// Purpose: Back dry-run execution and dependency-free tests.
// Dependencies: nexus-router-core, serde_json
// ============================================================================

//! ## Overview
//! The null adapter never touches the outside world. Every call succeeds
//! with the shared simulated-output placeholder, which echoes the tool,
//! method, and arguments so downstream consumers can see what would have
//! executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use nexus_router_core::DispatchAdapter;
use nexus_router_core::DispatchError;
use nexus_router_core::NULL_ADAPTER_ID;
use nexus_router_core::simulated_output;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Adapter that returns deterministic placeholder outputs.
///
/// # Invariants
/// - Calls always succeed and have no side effects.
#[derive(Debug, Clone)]
pub struct NullAdapter {
    /// Adapter identifier reported to the router.
    adapter_id: String,
}

impl NullAdapter {
    /// Creates a null adapter with the default identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapter_id: NULL_ADAPTER_ID.to_string(),
        }
    }

    /// Creates a null adapter with a custom identifier.
    #[must_use]
    pub fn with_adapter_id(adapter_id: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
        }
    }
}

impl Default for NullAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchAdapter for NullAdapter {
    fn adapter_id(&self) -> &str {
        &self.adapter_id
    }

    fn call(
        &self,
        tool: &str,
        method: &str,
        args: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DispatchError> {
        Ok(simulated_output(tool, method, args))
    }
}
