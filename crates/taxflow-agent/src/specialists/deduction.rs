use super::{render, Specialty, TaskPlan};
use taxflow_core::{Payload, Task, TaxflowResult};

const DEFAULT_TAX_YEAR: i64 = 2024;

/// Deduction optimization. Reads `taxpayer_data` and `tax_year`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeductionOptimization;

impl Specialty for DeductionOptimization {
    fn agent_name(&self) -> &'static str {
        "Deduction Optimizer Agent"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "standard_vs_itemized_analysis",
            "business_expense_optimization",
            "charitable_deduction_planning",
            "retirement_contribution_planning",
            "medical_expense_analysis",
        ]
    }

    fn plan(&self, task: &Task) -> TaxflowResult<TaskPlan> {
        let taxpayer_data = render(&task.object_or_empty("taxpayer_data")?);
        let tax_year = task.i64_or("tax_year", DEFAULT_TAX_YEAR)?;

        let mut output = Payload::new();
        output.insert("tax_year".into(), tax_year.into());
        // Placeholder until savings are computed from the generated plan.
        output.insert("potential_savings".into(), "calculated_savings".into());

        Ok(TaskPlan {
            query: format!("Tax deduction strategies for {tax_year}: {taxpayer_data}"),
            prompt: format!("Optimize deductions for tax year {tax_year}: {taxpayer_data}"),
            output,
            result_key: "optimization_suggestions",
        })
    }
}
