use super::{render, Specialty, TaskPlan};
use serde_json::json;
use taxflow_core::{Payload, Task, TaxflowResult};

/// Filing assistance. Reads `filing_type` and `taxpayer_info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilingAssistance;

impl Specialty for FilingAssistance {
    fn agent_name(&self) -> &'static str {
        "Filing Assistant Agent"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "form_1040_preparation",
            "schedule_c_preparation",
            "state_return_preparation",
            "amended_return_filing",
            "extension_filing",
        ]
    }

    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan> {
        let filing_type = task.str_or("filing_type", "1040")?;
        let taxpayer_info = render(&task.object_or_empty("taxpayer_info")?);

        let mut output = Payload::new();
        output.insert("filing_type".into(), filing_type.clone().into());
        output.insert("forms_prepared".into(), json!([filing_type]));

        Ok(TaskPlan {
            query: format!("Tax filing instructions for form {filing_type}"),
            prompt: format!("Prepare {filing_type} for: {taxpayer_info}"),
            output,
            result_key: "guidance",
        })
    }
}
