// crates/nexus-router-core/src/lib.rs
// ============================================================================
// Module: Nexus Router Core
// Description: Data model, interfaces, and runtime for the tool-call router.
// Purpose: Provide the event-sourced execution core shared by all backends.
// Dependencies: serde, serde_json, serde_jcs, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! This crate defines the Nexus Router core: the run and event data model,
//! the backend-agnostic [`interfaces::EventStore`] and
//! [`interfaces::DispatchAdapter`] contracts, canonical JSON hashing, and the
//! runtime (router, replayer, inspector). Backends live in sibling crates;
//! the core never opens storage or spawns processes itself.

pub mod core;
pub mod hashing;
pub mod interfaces;
pub mod runtime;
pub mod telemetry;

pub use crate::core::event::EventRecord;
pub use crate::core::event::EventType;
pub use crate::core::identifiers::AdapterId;
pub use crate::core::identifiers::EventId;
pub use crate::core::identifiers::RunId;
pub use crate::core::identifiers::StepId;
pub use crate::core::plan::PlanStep;
pub use crate::core::plan::ToolCall;
pub use crate::core::policy::RunPolicy;
pub use crate::core::request::RunOutcome;
pub use crate::core::request::RunRef;
pub use crate::core::request::RunRequest;
pub use crate::core::request::RunResponse;
pub use crate::core::request::RunSummary;
pub use crate::core::request::StepResult;
pub use crate::core::request::StepStatus;
pub use crate::core::run::RunCounts;
pub use crate::core::run::RunFilter;
pub use crate::core::run::RunMode;
pub use crate::core::run::RunRecord;
pub use crate::core::run::RunStatus;
pub use crate::core::time::Timestamp;
pub use crate::interfaces::ADAPTER_BUG_CODE;
pub use crate::interfaces::DispatchAdapter;
pub use crate::interfaces::DispatchError;
pub use crate::interfaces::EventStore;
pub use crate::interfaces::NULL_ADAPTER_ID;
pub use crate::interfaces::StoreError;
pub use crate::interfaces::simulated_output;
pub use crate::runtime::inspect::InspectReport;
pub use crate::runtime::inspect::RunDigest;
pub use crate::runtime::replay::ReplayReport;
pub use crate::runtime::replay::RunView;
pub use crate::runtime::replay::StepTimeline;
pub use crate::runtime::replay::Violation;
pub use crate::runtime::replay::ViolationCode;
pub use crate::runtime::router::Router;
