use super::{render, Specialty, TaskPlan};
use serde_json::json;
use taxflow_core::{Payload, Task, TaxflowResult};

/// Compliance checks. Reads `filing_data` and `jurisdiction`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceCheck;

impl Specialty for ComplianceCheck {
    fn agent_name(&self) -> &'static str {
        "Compliance Checker Agent"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "federal_compliance_check",
            "state_compliance_check",
            "filing_deadline_verification",
            "form_completeness_check",
            "regulation_adherence_check",
        ]
    }

    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan> {
        let filing_data = render(&task.object_or_empty("filing_data")?);
        let jurisdiction = task.str_or("jurisdiction", "federal")?;

        let mut output = Payload::new();
        output.insert("jurisdiction".into(), jurisdiction.clone().into());
        output.insert("compliance_status".into(), "compliant".into());
        output.insert("issues_found".into(), json!([]));

        Ok(TaskPlan {
            query: format!("Tax compliance rules for {jurisdiction}: {filing_data}"),
            prompt: format!("Check compliance for {jurisdiction} with data: {filing_data}"),
            output,
            result_key: "report",
        })
    }
}
