// crates/nexus-router-core/src/runtime/router.rs
// ============================================================================
// Module: Plan Router
// Description: Deterministic plan executor with policy gating.
// Purpose: Walk the plan, emit the canonical event sequence, aggregate results.
// Dependencies: crate::core, crate::interfaces, crate::telemetry, serde_json
// ============================================================================

//! ## Overview
//! The router owns the write path of a single run. Event emission order is
//! fixed and observable: `RUN_STARTED` at seq 0, `PLAN_CREATED`, the policy
//! gate, one `STEP_STARTED` / `TOOL_CALL_REQUESTED` / result /
//! `STEP_COMPLETED` group per step, `PROVENANCE_EMITTED`, then exactly one
//! terminal event mirrored into the run status.
//!
//! Operational tool failures are recorded and execution continues with the
//! next step. Bug failures, including panics escaping an adapter, fail the
//! whole run after a final `TOOL_CALL_FAILED` / `RUN_FAILED` pair.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic;
use std::panic::AssertUnwindSafe;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::event::EventType;
use crate::core::event::PlanCreatedPayload;
use crate::core::event::ProvenanceEmittedPayload;
use crate::core::event::ProvenanceRecord;
use crate::core::event::RunCompletedPayload;
use crate::core::event::RunFailedPayload;
use crate::core::event::RunStartedPayload;
use crate::core::event::StepCompletedPayload;
use crate::core::event::StepStartedPayload;
use crate::core::event::ToolCallFailedPayload;
use crate::core::event::ToolCallRequestedPayload;
use crate::core::event::ToolCallSucceededPayload;
use crate::core::identifiers::AdapterId;
use crate::core::identifiers::RunId;
use crate::core::plan::PlanStep;
use crate::core::policy::ADAPTER_BUG_REASON;
use crate::core::policy::POLICY_DENIED_REASON;
use crate::core::policy::RunPolicy;
use crate::core::request::RunOutcome;
use crate::core::request::RunRef;
use crate::core::request::RunRequest;
use crate::core::request::RunResponse;
use crate::core::request::RunSummary;
use crate::core::request::StepResult;
use crate::core::request::StepStatus;
use crate::core::run::RunMode;
use crate::core::run::RunStatus;
use crate::interfaces::ADAPTER_BUG_CODE;
use crate::interfaces::DispatchAdapter;
use crate::interfaces::DispatchError;
use crate::interfaces::EventStore;
use crate::interfaces::NULL_ADAPTER_ID;
use crate::interfaces::StoreError;
use crate::interfaces::simulated_output;
use crate::telemetry::MetricsSink;
use crate::telemetry::NoopMetricsSink;
use crate::telemetry::ToolCallOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version label stamped into provenance payloads.
const PROVENANCE_VERSION: &str = "v0.1";

/// Shared no-op sink used when no metrics sink is configured.
static NOOP_METRICS: NoopMetricsSink = NoopMetricsSink;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Deterministic plan executor bound to one store and one adapter.
///
/// # Invariants
/// - Steps execute strictly in plan order with no parallelism.
/// - The store handle is held for the duration of one run.
pub struct Router<'a> {
    /// Event store receiving the run's append-only log.
    store: &'a dyn EventStore,
    /// Adapter executing apply-mode tool calls.
    adapter: &'a dyn DispatchAdapter,
    /// Metrics sink receiving run and tool-call outcomes.
    metrics: &'a dyn MetricsSink,
}

impl<'a> Router<'a> {
    /// Creates a router with no metrics sink.
    #[must_use]
    pub fn new(store: &'a dyn EventStore, adapter: &'a dyn DispatchAdapter) -> Self {
        Self {
            store,
            adapter,
            metrics: &NOOP_METRICS,
        }
    }

    /// Creates a router that reports outcomes to the given sink.
    #[must_use]
    pub fn with_metrics(
        store: &'a dyn EventStore,
        adapter: &'a dyn DispatchAdapter,
        metrics: &'a dyn MetricsSink,
    ) -> Self {
        Self {
            store,
            adapter,
            metrics,
        }
    }

    /// Executes a validated run request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures; tool
    /// failures and policy denials are encoded in the response and the
    /// event log instead.
    pub fn run(&self, request: &RunRequest) -> Result<RunResponse, StoreError> {
        let run_id = self.store.create_run(request.mode, &request.goal)?;

        self.append(&run_id, EventType::RunStarted, &RunStartedPayload {
            mode: request.mode,
            goal: request.goal.clone(),
        })?;
        self.append(&run_id, EventType::PlanCreated, &PlanCreatedPayload {
            plan: request.plan_override.clone(),
        })?;

        let adapter_id = self.effective_adapter_id(request.mode);

        if request.mode == RunMode::Apply && !policy_permits_apply(request.policy.as_ref()) {
            return self.deny_by_policy(&run_id, request.mode, adapter_id);
        }

        let mut results = Vec::with_capacity(request.plan_override.len());
        let mut outputs_applied = 0_u64;
        let mut outputs_skipped = 0_u64;

        for step in &request.plan_override {
            match self.execute_step(&run_id, request.mode, step)? {
                StepFlow::Continue(result) => {
                    match result.status {
                        StepStatus::Ok => {
                            if request.mode == RunMode::Apply {
                                outputs_applied += 1;
                            }
                        }
                        StepStatus::Error => outputs_skipped += 1,
                    }
                    results.push(result);
                }
                StepFlow::Abort(result) => {
                    results.push(result);
                    return self.fail_on_bug(&run_id, request.mode, adapter_id, results);
                }
            }
        }

        let provenance = ProvenanceEmittedPayload {
            provenance: ProvenanceRecord {
                version: PROVENANCE_VERSION.to_string(),
                mode: request.mode,
                adapter_id: adapter_id.clone(),
                steps_total: u64::try_from(request.plan_override.len()).unwrap_or(u64::MAX),
            },
        };
        self.append(&run_id, EventType::ProvenanceEmitted, &provenance)?;
        self.append(&run_id, EventType::RunCompleted, &RunCompletedPayload {
            outcome: RunOutcome::Ok,
        })?;
        self.store.set_run_status(&run_id, RunStatus::Completed)?;
        self.metrics.record_run_completed();

        Ok(RunResponse {
            run: RunRef {
                run_id,
            },
            summary: RunSummary {
                mode: request.mode,
                adapter_id,
                outputs_applied,
                outputs_skipped,
                outcome: RunOutcome::Ok,
            },
            results,
        })
    }

    /// Returns the adapter identifier the run executes under.
    ///
    /// Dry runs execute through the null placeholder regardless of the
    /// configured adapter, and report accordingly.
    fn effective_adapter_id(&self, mode: RunMode) -> AdapterId {
        match mode {
            RunMode::DryRun => AdapterId::new(NULL_ADAPTER_ID),
            RunMode::Apply => AdapterId::new(self.adapter.adapter_id()),
        }
    }

    /// Emits the event group for one step and classifies the outcome.
    fn execute_step(
        &self,
        run_id: &RunId,
        mode: RunMode,
        step: &PlanStep,
    ) -> Result<StepFlow, StoreError> {
        self.append(run_id, EventType::StepStarted, &StepStartedPayload {
            step_id: step.step_id.clone(),
            intent: step.intent.clone(),
        })?;
        self.append(run_id, EventType::ToolCallRequested, &ToolCallRequestedPayload {
            step_id: step.step_id.clone(),
            call: step.call.clone(),
        })?;

        let outcome = match mode {
            RunMode::DryRun => {
                Ok(simulated_output(&step.call.tool, &step.call.method, &step.call.args))
            }
            RunMode::Apply => self.invoke_adapter(step),
        };

        match outcome {
            Ok(output) => {
                self.append(run_id, EventType::ToolCallSucceeded, &ToolCallSucceededPayload {
                    step_id: step.step_id.clone(),
                    output: output.clone(),
                })?;
                self.append(run_id, EventType::StepCompleted, &StepCompletedPayload {
                    step_id: step.step_id.clone(),
                    status: StepStatus::Ok,
                })?;
                self.metrics.record_tool_call(ToolCallOutcome::Succeeded);
                Ok(StepFlow::Continue(StepResult {
                    step_id: step.step_id.clone(),
                    status: StepStatus::Ok,
                    output: Some(output),
                    error_code: None,
                    message: None,
                    simulated: (mode == RunMode::DryRun).then_some(true),
                }))
            }
            Err(DispatchError::Operational {
                code,
                message,
            }) => {
                self.append(run_id, EventType::ToolCallFailed, &ToolCallFailedPayload {
                    step_id: step.step_id.clone(),
                    error_code: code.clone(),
                    message: message.clone(),
                })?;
                self.append(run_id, EventType::StepCompleted, &StepCompletedPayload {
                    step_id: step.step_id.clone(),
                    status: StepStatus::Error,
                })?;
                self.metrics.record_tool_call(ToolCallOutcome::OperationalFailure);
                Ok(StepFlow::Continue(StepResult {
                    step_id: step.step_id.clone(),
                    status: StepStatus::Error,
                    output: None,
                    error_code: Some(code),
                    message: Some(message),
                    simulated: None,
                }))
            }
            Err(DispatchError::Bug {
                message, ..
            }) => {
                self.append(run_id, EventType::ToolCallFailed, &ToolCallFailedPayload {
                    step_id: step.step_id.clone(),
                    error_code: ADAPTER_BUG_CODE.to_string(),
                    message: message.clone(),
                })?;
                self.metrics.record_tool_call(ToolCallOutcome::BugFailure);
                Ok(StepFlow::Abort(StepResult {
                    step_id: step.step_id.clone(),
                    status: StepStatus::Error,
                    output: None,
                    error_code: Some(ADAPTER_BUG_CODE.to_string()),
                    message: Some(message),
                    simulated: None,
                }))
            }
        }
    }

    /// Invokes the adapter, collapsing escaping panics into bug errors.
    fn invoke_adapter(&self, step: &PlanStep) -> Result<Map<String, Value>, DispatchError> {
        let call = &step.call;
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.adapter.call(&call.tool, &call.method, &call.args)
        }))
        .unwrap_or_else(|cause| {
            Err(DispatchError::bug(ADAPTER_BUG_CODE, panic_message(cause.as_ref())))
        })
    }

    /// Records a policy denial and builds the denied response.
    fn deny_by_policy(
        &self,
        run_id: &RunId,
        mode: RunMode,
        adapter_id: AdapterId,
    ) -> Result<RunResponse, StoreError> {
        self.append(run_id, EventType::RunFailed, &RunFailedPayload {
            reason: POLICY_DENIED_REASON.to_string(),
        })?;
        self.store.set_run_status(run_id, RunStatus::Failed)?;
        self.metrics.record_run_failed(POLICY_DENIED_REASON);
        Ok(RunResponse {
            run: RunRef {
                run_id: run_id.clone(),
            },
            summary: RunSummary {
                mode,
                adapter_id,
                outputs_applied: 0,
                outputs_skipped: 0,
                outcome: RunOutcome::Error,
            },
            results: Vec::new(),
        })
    }

    /// Records an adapter-bug abort and builds the failed response.
    fn fail_on_bug(
        &self,
        run_id: &RunId,
        mode: RunMode,
        adapter_id: AdapterId,
        results: Vec<StepResult>,
    ) -> Result<RunResponse, StoreError> {
        self.append(run_id, EventType::RunFailed, &RunFailedPayload {
            reason: ADAPTER_BUG_REASON.to_string(),
        })?;
        self.store.set_run_status(run_id, RunStatus::Failed)?;
        self.metrics.record_run_failed(ADAPTER_BUG_REASON);
        let (applied, skipped) = tally_results(mode, &results);
        Ok(RunResponse {
            run: RunRef {
                run_id: run_id.clone(),
            },
            summary: RunSummary {
                mode,
                adapter_id,
                outputs_applied: applied,
                outputs_skipped: skipped,
                outcome: RunOutcome::Error,
            },
            results,
        })
    }

    /// Serializes a typed payload and appends it to the run log.
    fn append<T: Serialize>(
        &self,
        run_id: &RunId,
        event_type: EventType,
        payload: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(payload)
            .map_err(|err| StoreError::Invalid(format!("payload serialization failed: {err}")))?;
        self.store.append(run_id, event_type, &value)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Control-flow outcome of one executed step.
enum StepFlow {
    /// Step finished; execution continues with the next step.
    Continue(StepResult),
    /// Step hit an adapter bug; the run must abort.
    Abort(StepResult),
}

/// Returns true when the request policy explicitly permits apply mode.
fn policy_permits_apply(policy: Option<&RunPolicy>) -> bool {
    policy.is_some_and(|policy| policy.permits_apply())
}

/// Tallies applied/skipped counts from accumulated step results.
///
/// Only operational failures count as skipped; an aborting bug step is
/// neither applied nor skipped.
fn tally_results(mode: RunMode, results: &[StepResult]) -> (u64, u64) {
    let mut applied = 0_u64;
    let mut skipped = 0_u64;
    for result in results {
        match result.status {
            StepStatus::Ok => {
                if mode == RunMode::Apply {
                    applied += 1;
                }
            }
            StepStatus::Error => {
                if result.error_code.as_deref() != Some(ADAPTER_BUG_CODE) {
                    skipped += 1;
                }
            }
        }
    }
    (applied, skipped)
}

/// Extracts a printable message from a panic payload.
fn panic_message(cause: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "adapter panicked".to_string()
    }
}
