// crates/nexus-router-core/src/core/policy.rs
// ============================================================================
// Module: Run Policy
// Description: Policy shape gating apply-mode execution.
// Purpose: Fail closed on apply-mode runs that were not explicitly allowed.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The policy gate is deliberately small: apply-mode execution requires an
//! explicit `allow_apply: true`. A missing policy or a missing flag denies
//! the run before any step executes. Unknown policy fields are preserved for
//! additive evolution but carry no semantics here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Run policy attached to a request.
///
/// # Invariants
/// - `allow_apply` defaults to `false`; absence denies apply-mode runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPolicy {
    /// Whether apply-mode execution is permitted.
    #[serde(default)]
    pub allow_apply: bool,
}

impl RunPolicy {
    /// Returns true when the policy permits apply-mode execution.
    #[must_use]
    pub const fn permits_apply(self) -> bool {
        self.allow_apply
    }
}

/// Stable failure reason recorded when the policy gate denies a run.
pub const POLICY_DENIED_REASON: &str = "policy_denied";

/// Stable failure reason recorded when an adapter bug aborts a run.
pub const ADAPTER_BUG_REASON: &str = "adapter_bug";
