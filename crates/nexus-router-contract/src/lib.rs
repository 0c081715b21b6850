// crates/nexus-router-contract/src/lib.rs
// ============================================================================
// Module: Nexus Router Contract
// Description: Public tool surface with versioned request/response schemas.
// Purpose: Validate requests at the trust boundary and route to the core.
// Dependencies: jsonschema, nexus-router-core, nexus-router-store-sqlite,
//               serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The contract crate is the public face of Nexus Router: the three tool
//! identifiers (`nexus-router.run`, `nexus-router.inspect`,
//! `nexus-router.replay`), their embedded JSON schemas, and entry points
//! that validate raw requests before anything touches storage. A request
//! that fails validation never creates a run.

mod tooling;
mod tools;

pub use tooling::ToolDefinition;
pub use tooling::ToolName;
pub use tooling::tool_definitions;
pub use tools::InspectRequest;
pub use tools::ReplayRequest;
pub use tools::ToolError;
pub use tools::inspect;
pub use tools::replay;
pub use tools::run;
