// crates/nexus-router-dispatch/src/lib.rs
// ============================================================================
// Module: Nexus Router Dispatch
// Description: Dispatch adapters implementing the tool-call transport layer.
// Purpose: Provide null, fake, and subprocess realizations of DispatchAdapter.
// Dependencies: nexus-router-core, serde, serde_json, tempfile, thiserror
// ============================================================================

//! ## Overview
//! Three adapters cover the dispatch capability: [`NullAdapter`] returns
//! deterministic placeholders for dry runs and tests, [`FakeAdapter`] plays
//! back programmed responses and records a call log, and
//! [`SubprocessAdapter`] shells out (without a shell) to an external command
//! speaking the `call <tool> <method> --json-args-file <path>` wire
//! contract. All failure paths map into the two-class error taxonomy of
//! [`nexus_router_core::DispatchError`].

mod fake;
mod null;
mod subprocess;

pub use fake::CallLogEntry;
pub use fake::DEFAULT_OPERATIONAL_CODE;
pub use fake::FakeAdapter;
pub use null::NullAdapter;
pub use subprocess::ERROR_CODE_COMMAND_NOT_FOUND;
pub use subprocess::ERROR_CODE_INVALID_JSON_OUTPUT;
pub use subprocess::ERROR_CODE_NONZERO_EXIT;
pub use subprocess::ERROR_CODE_OS_ERROR;
pub use subprocess::ERROR_CODE_TIMEOUT;
pub use subprocess::SubprocessAdapter;
pub use subprocess::SubprocessAdapterConfig;
pub use subprocess::SubprocessConfigError;
pub use subprocess::derive_adapter_id;
