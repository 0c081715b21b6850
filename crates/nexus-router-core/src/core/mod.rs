// crates/nexus-router-core/src/core/mod.rs
// ============================================================================
// Module: Core Data Model
// Description: Run, event, plan, and policy shapes for Nexus Router.
// Purpose: Group the wire-stable data model consumed by stores and tools.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! The data model is wire-stable: every shape here serializes into the form
//! persisted by stores or returned by the public tools. Evolution is
//! additive only within `v0.x`.

pub mod event;
pub mod identifiers;
pub mod plan;
pub mod policy;
pub mod request;
pub mod run;
pub mod time;
