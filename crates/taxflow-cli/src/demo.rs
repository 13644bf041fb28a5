//! Built-in demo tasks, workflow and reference documents.

use serde_json::json;
use taxflow_core::Task;
use taxflow_orchestrator::{Step, Workflow};

/// Seeded into retrieval when no document directory is given.
pub fn sample_documents() -> Vec<String> {
    vec![
        "Tax regulations for 2024: Standard deduction, tax brackets and filing thresholds."
            .to_string(),
        "Business expense deduction rules and limits.".to_string(),
        "State tax filing requirements and deadlines.".to_string(),
    ]
}

/// One calculation, one document analysis and one compliance check.
pub fn demo_tasks() -> Vec<Task> {
    vec![
        Task::new("calculation")
            .with_field("type", "income_tax")
            .with_field("data", json!({"income": 100000, "filing_status": "married"})),
        Task::new("document")
            .with_field("document_type", "W-2")
            .with_field("content", "Wages: $100,000, Federal tax: $15,000"),
        Task::new("compliance")
            .with_field("filing_data", json!({"forms": ["1040"]}))
            .with_field("jurisdiction", "federal"),
    ]
}

/// Document analysis in parallel, then a sequential calculation.
pub fn demo_workflow() -> Workflow {
    Workflow::new("Basic Tax Filing")
        .with_step(Step::parallel(
            "Document Analysis",
            vec![
                Task::new("document")
                    .with_field("document_type", "W-2")
                    .with_field("content", "Income data"),
                Task::new("document")
                    .with_field("document_type", "1099")
                    .with_field("content", "Interest data"),
            ],
        ))
        .with_step(Step::sequential(
            "Tax Calculation",
            vec![Task::new("calculation").with_field("data", json!({"income": 85000}))],
        ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use taxflow_orchestrator::StepMode;

    #[test]
    fn test_demo_tasks_cover_three_agents() {
        let types: Vec<_> = demo_tasks()
            .into_iter()
            .map(|t| t.agent_type.unwrap())
            .collect();
        assert_eq!(types, vec!["calculation", "document", "compliance"]);
    }

    #[test]
    fn test_demo_workflow_shape() {
        let workflow = demo_workflow();
        assert_eq!(workflow.steps.len(), 2);
        assert_eq!(workflow.steps[0].mode, StepMode::Parallel);
        assert_eq!(workflow.steps[0].tasks.len(), 2);
        assert_eq!(workflow.steps[1].mode, StepMode::Sequential);
    }
}
