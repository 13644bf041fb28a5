//! Specialist tax agents and the generation backends they call.
//!
//! # Main types
//!
//! - [`TaxAgent`]: the contract every worker in the orchestrator registry satisfies.
//! - [`SpecialistAgent`]: shared retrieval, prompt and generation pipeline.
//! - [`Specialty`]: per-domain payload, query and prompt logic.
//! - [`GenerationProvider`]: mock and OpenAI-compatible text generation.
//! - [`ModelConfig`]: backend and model settings.

/// The agent contract and shared pipeline.
pub mod agent;
/// Model and backend configuration.
pub mod config;
/// Generation backends.
pub mod generation;
pub mod specialists;

pub use agent::{
    build_prompt_with_context, AgentStatus, AgentStatusSnapshot, SpecialistAgent, TaskRecord,
    TaxAgent, DEFAULT_RETRIEVAL_K,
};
pub use config::{GenerationBackend, ModelConfig};
pub use generation::{
    generation_from_config, GenerationProvider, MockGeneration, OpenAiGeneration,
};
pub use specialists::{
    Calculation, ComplianceCheck, ComplianceCheckerAgent, DeductionOptimization,
    DeductionOptimizerAgent, DocumentAnalysis, DocumentAnalyzerAgent, FilingAssistance,
    FilingAssistantAgent, Specialty, TaskPlan, TaxCalculatorAgent,
};
