use super::{render, Specialty, TaskPlan};
use taxflow_core::{Payload, Task, TaxflowResult};

/// Tax calculations. Reads `type` and `data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calculation;

impl Specialty for Calculation {
    fn agent_name(&self) -> &'static str {
        "Tax Calculator Agent"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "income_tax_calculation",
            "deduction_analysis",
            "tax_credit_evaluation",
            "estimated_tax_calculation",
            "tax_bracket_analysis",
        ]
    }

    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan> {
        let task_type = task.str_or("type", "general_calculation")?;
        let data = render(&task.object_or_empty("data")?);

        let mut output = Payload::new();
        output.insert("task_type".into(), task_type.clone().into());

        Ok(TaskPlan {
            query: format!("Tax calculation rules for {task_type}: {data}"),
            prompt: format!("Calculate taxes for: {task_type} with data: {data}"),
            output,
            result_key: "calculation",
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_defaults() {
        let plan = Calculation.plan(&Task::new("calculation")).unwrap();
        assert_eq!(plan.query, "Tax calculation rules for general_calculation: {}");
        assert_eq!(
            plan.prompt,
            "Calculate taxes for: general_calculation with data: {}"
        );
        assert_eq!(plan.output["task_type"], "general_calculation");
        assert_eq!(plan.result_key, "calculation");
    }

    #[test]
    fn test_plan_with_data() {
        let task = Task::new("calculation")
            .with_field("type", "income_tax")
            .with_field("data", json!({"income": 75000}));
        let plan = Calculation.plan(&task).unwrap();
        assert_eq!(
            plan.prompt,
            r#"Calculate taxes for: income_tax with data: {"income":75000}"#
        );
    }
}
