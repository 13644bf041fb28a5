//! Domain logic plugged into [`crate::SpecialistAgent`].
//!
//! Each specialty reads its own payload keys, builds the retrieval query and
//! prompt, and pre-fills the static part of its success envelope. The agent
//! adds the generated text under [`TaskPlan::result_key`].

mod calculation;
mod compliance;
mod deduction;
mod document;
mod filing;

pub use calculation::Calculation;
pub use compliance::ComplianceCheck;
pub use deduction::DeductionOptimization;
pub use document::DocumentAnalysis;
pub use filing::FilingAssistance;

use crate::agent::SpecialistAgent;
use serde_json::Value;
use taxflow_core::{Payload, Task, TaxflowResult};

/// Everything an agent needs to run one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPlan {
    /// Query sent to the context provider.
    pub query: String,
    /// Prompt sent to the generation provider, before context is added.
    pub prompt: String,
    /// Output keys known before generation.
    pub output: Payload,
    /// Output key that receives the generated text.
    pub result_key: &'static str,
}

/// Per-domain behavior of a [`SpecialistAgent`].
pub trait Specialty: Send + Sync + 'static {
    /// Display name of agents with this specialty.
    fn agent_name(&self) -> &'static str;

    /// Capability tags.
    fn capabilities(&self) -> &'static [&'static str];

    /// Reads the payload and plans the task. Missing keys take defaults;
    /// present keys of the wrong type are a payload error.
    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan>;
}

/// Income tax, credit and bracket calculations.
pub type TaxCalculatorAgent = SpecialistAgent<Calculation>;
/// W-2, 1099, receipt and statement analysis.
pub type DocumentAnalyzerAgent = SpecialistAgent<DocumentAnalysis>;
/// Federal and state compliance checks.
pub type ComplianceCheckerAgent = SpecialistAgent<ComplianceCheck>;
/// Deduction strategy and savings.
pub type DeductionOptimizerAgent = SpecialistAgent<DeductionOptimization>;
/// Return preparation and filing guidance.
pub type FilingAssistantAgent = SpecialistAgent<FilingAssistance>;

/// Compact JSON rendering of an object payload for queries and prompts.
pub(crate) fn render(map: &Payload) -> String {
    Value::Object(map.clone()).to_string()
}
