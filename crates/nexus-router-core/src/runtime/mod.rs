// crates/nexus-router-core/src/runtime/mod.rs
// ============================================================================
// Module: Nexus Router Runtime
// Description: Plan execution, replay validation, and run inspection.
// Purpose: Group the read/write runtime built on the core interfaces.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime has one writer and two readers. The router walks a plan and
//! emits the canonical event sequence; the replayer folds a run's events
//! back into a view and proves the ordering invariants; the inspector
//! derives summaries without validating anything.

pub mod inspect;
pub mod replay;
pub mod router;
