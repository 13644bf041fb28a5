//! Multi-agent tax task orchestration.
//!
//! Routes tasks to a fixed registry of specialist agents, runs them singly,
//! in parallel fan-out or as ordered workflow steps, and tracks in-flight and
//! completed work. Every public operation returns data: agent faults and
//! panics are turned into error envelopes.
//!
//! # Main types
//!
//! - [`Orchestrator`]: single-task executor, fan-out, workflow engine, status and shutdown.
//! - [`Router`]: `agent_type` to agent resolution with calculator fallback.
//! - [`TaskLedger`]: active task table and completed log.
//! - [`Workflow`] / [`Step`]: request-time workflow descriptions.

/// Orchestration engine.
pub mod engine;
/// Active table and completed log.
pub mod ledger;
/// Agent registry and routing.
pub mod router;
/// Workflow, report and statistics types.
pub mod types;
mod workflow;

pub use engine::Orchestrator;
pub use ledger::TaskLedger;
pub use router::{
    registry_name_for, standard_registry, Router, COMPLIANCE_CHECKER, DEDUCTION_OPTIMIZER,
    DOCUMENT_ANALYZER, FILING_ASSISTANT, TAX_CALCULATOR,
};
pub use types::{
    ActiveTask, CompletedTask, OrchestratorConfig, OrchestratorStatistics, RunStatus, Step,
    StepMode, StepReport, Workflow, WorkflowReport, WorkflowStatus,
};
