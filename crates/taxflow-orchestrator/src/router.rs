use std::collections::BTreeMap;
use std::sync::Arc;
use taxflow_agent::{
    Calculation, ComplianceCheck, DeductionOptimization, DocumentAnalysis, FilingAssistance,
    GenerationProvider, SpecialistAgent, Specialty, TaxAgent,
};
use taxflow_core::ContextProvider;
use tracing::{debug, warn};

/// Registry name of the calculator, also the fallback target.
pub const TAX_CALCULATOR: &str = "tax_calculator";
/// Registry name of the document analyzer.
pub const DOCUMENT_ANALYZER: &str = "document_analyzer";
/// Registry name of the compliance checker.
pub const COMPLIANCE_CHECKER: &str = "compliance_checker";
/// Registry name of the deduction optimizer.
pub const DEDUCTION_OPTIMIZER: &str = "deduction_optimizer";
/// Registry name of the filing assistant.
pub const FILING_ASSISTANT: &str = "filing_assistant";

/// Maps a task's `agent_type` onto a registry name.
pub fn registry_name_for(agent_type: &str) -> Option<&'static str> {
    match agent_type {
        "calculation" => Some(TAX_CALCULATOR),
        "document" => Some(DOCUMENT_ANALYZER),
        "compliance" => Some(COMPLIANCE_CHECKER),
        "deduction" => Some(DEDUCTION_OPTIMIZER),
        "filing" => Some(FILING_ASSISTANT),
        _ => None,
    }
}

/// Immutable agent registry with fallback routing.
pub struct Router {
    agents: BTreeMap<String, Arc<dyn TaxAgent>>,
}

impl Router {
    /// Wraps a registry keyed by registry name.
    pub fn new(agents: impl IntoIterator<Item = (String, Arc<dyn TaxAgent>)>) -> Self {
        Self {
            agents: agents.into_iter().collect(),
        }
    }

    /// Resolves the agent for `agent_type`.
    ///
    /// Unknown or missing types go to the calculator, or to the first
    /// registered agent when no calculator is registered. `None` only for an
    /// empty registry.
    pub fn route(&self, agent_type: Option<&str>) -> Option<(&str, &Arc<dyn TaxAgent>)> {
        if let Some(name) = agent_type.and_then(registry_name_for) {
            if let Some((key, agent)) = self.agents.get_key_value(name) {
                debug!(agent_type, registry_name = %key, "Routing task");
                return Some((key.as_str(), agent));
            }
        }

        warn!(
            agent_type = agent_type.unwrap_or(""),
            "Unknown task type, using default agent"
        );
        self.agents
            .get_key_value(TAX_CALCULATOR)
            .or_else(|| self.agents.iter().next())
            .map(|(key, agent)| (key.as_str(), agent))
    }

    /// Looks up an agent by registry name.
    pub fn get(&self, registry_name: &str) -> Option<&Arc<dyn TaxAgent>> {
        self.agents.get(registry_name)
    }

    /// All agents in registry-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn TaxAgent>)> {
        self.agents.iter()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// The five standard specialists sharing one context and generation provider.
pub fn standard_registry(
    context: Option<Arc<dyn ContextProvider>>,
    generation: Arc<dyn GenerationProvider>,
    retrieval_k: usize,
) -> Vec<(String, Arc<dyn TaxAgent>)> {
    fn build<S: Specialty>(
        id: &str,
        specialty: S,
        context: &Option<Arc<dyn ContextProvider>>,
        generation: &Arc<dyn GenerationProvider>,
        retrieval_k: usize,
    ) -> Arc<dyn TaxAgent> {
        let agent =
            SpecialistAgent::new(id, specialty, Arc::clone(generation)).with_retrieval_k(retrieval_k);
        match context {
            Some(ctx) => Arc::new(agent.with_context(Arc::clone(ctx))),
            None => Arc::new(agent),
        }
    }

    vec![
        (
            TAX_CALCULATOR.to_string(),
            build("calc_001", Calculation, &context, &generation, retrieval_k),
        ),
        (
            DOCUMENT_ANALYZER.to_string(),
            build("doc_001", DocumentAnalysis, &context, &generation, retrieval_k),
        ),
        (
            COMPLIANCE_CHECKER.to_string(),
            build("comp_001", ComplianceCheck, &context, &generation, retrieval_k),
        ),
        (
            DEDUCTION_OPTIMIZER.to_string(),
            build("deduct_001", DeductionOptimization, &context, &generation, retrieval_k),
        ),
        (
            FILING_ASSISTANT.to_string(),
            build("file_001", FilingAssistance, &context, &generation, retrieval_k),
        ),
    ]
}
