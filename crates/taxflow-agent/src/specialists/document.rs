use super::{Specialty, TaskPlan};
use serde_json::json;
use taxflow_core::{Payload, Task, TaxflowResult};

/// Document analysis. Reads `document_type` and `content`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAnalysis;

impl Specialty for DocumentAnalysis {
    fn agent_name(&self) -> &'static str {
        "Document Analyzer Agent"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "w2_form_analysis",
            "1099_form_analysis",
            "receipt_extraction",
            "bank_statement_analysis",
            "invoice_processing",
            "document_classification",
        ]
    }

    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan> {
        let document_type = task.str_or("document_type", "general")?;
        let content = task.str_or("content", "")?;

        let mut output = Payload::new();
        output.insert("document_type".into(), document_type.clone().into());
        output.insert(
            "extracted_fields".into(),
            json!({
                "extracted": true,
                "field_count": content.split_whitespace().count(),
            }),
        );

        Ok(TaskPlan {
            query: format!("Tax document analysis for {document_type}"),
            prompt: format!("Analyze this {document_type} document: {content}"),
            output,
            result_key: "analysis",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_count() {
        let task = Task::new("document")
            .with_field("document_type", "W-2")
            .with_field("content", "Employer: Acme Corp  Wages: 75000");
        let plan = DocumentAnalysis.plan(&task).unwrap();
        assert_eq!(plan.query, "Tax document analysis for W-2");
        assert_eq!(plan.output["extracted_fields"]["field_count"], 5);
        assert_eq!(plan.output["extracted_fields"]["extracted"], true);
    }

    #[test]
    fn test_empty_content() {
        let plan = DocumentAnalysis.plan(&Task::new("document")).unwrap();
        assert_eq!(plan.prompt, "Analyze this general document: ");
        assert_eq!(plan.output["extracted_fields"]["field_count"], 0);
    }

    #[test]
    fn test_non_string_content_rejected() {
        let task = Task::new("document").with_field("content", serde_json::json!([1, 2]));
        assert!(DocumentAnalysis.plan(&task).is_err());
    }
}
