use crate::engine::Orchestrator;
use crate::types::{Step, StepMode, StepReport, Workflow, WorkflowReport, WorkflowStatus};
use chrono::Utc;
use taxflow_core::{Envelope, Task};
use tracing::info;

impl Orchestrator {
    /// Runs the steps of `workflow` in order.
    ///
    /// Parallel steps fan out, sequential steps run one task at a time. A
    /// failing task never aborts the workflow; its error envelope is kept in
    /// the step results and the report status is always `completed`.
    pub async fn execute_workflow(&self, workflow: Workflow) -> WorkflowReport {
        info!(workflow = %workflow.name, steps = workflow.steps.len(), "Processing workflow");
        let start_time = Utc::now();

        let mut steps = Vec::with_capacity(workflow.steps.len());
        for step in workflow.steps {
            steps.push(self.execute_step(step).await);
        }

        let report = WorkflowReport {
            workflow_name: workflow.name,
            start_time,
            end_time: Utc::now(),
            status: WorkflowStatus::Completed,
            steps,
        };
        info!(workflow = %report.workflow_name, "Workflow completed");
        report
    }

    /// Executes a single step.
    pub async fn execute_step(&self, step: Step) -> StepReport {
        info!(step = %step.name, mode = %step.mode, tasks = step.tasks.len(), "Running step");

        let results = match step.mode {
            StepMode::Parallel => self.execute_parallel(step.tasks).await,
            StepMode::Sequential => self.execute_sequential(step.tasks).await,
        };

        StepReport {
            step_name: step.name,
            step_type: step.mode,
            results,
        }
    }

    /// Executes `tasks` strictly one after another.
    pub async fn execute_sequential(&self, tasks: Vec<Task>) -> Vec<Envelope> {
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(self.route_and_execute(task).await);
        }
        results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::engine::Orchestrator;
    use crate::types::{OrchestratorConfig, Step, StepMode, Workflow, WorkflowStatus};
    use taxflow_agent::{generation_from_config, ModelConfig};
    use taxflow_core::Task;

    #[tokio::test]
    async fn test_empty_workflow() {
        let orch = Orchestrator::new(
            OrchestratorConfig::default(),
            None,
            generation_from_config(&ModelConfig::instant_mock()),
        );
        let report = orch.execute_workflow(Workflow::new("noop")).await;
        assert_eq!(report.status, WorkflowStatus::Completed);
        assert!(report.steps.is_empty());
        assert!(report.end_time >= report.start_time);
    }

    #[tokio::test]
    async fn test_step_reports_follow_step_order() {
        let orch = Orchestrator::new(
            OrchestratorConfig::default(),
            None,
            generation_from_config(&ModelConfig::instant_mock()),
        );
        let wf = Workflow::new("annual")
            .with_step(Step::parallel("gather", vec![Task::new("document")]))
            .with_step(Step::sequential(
                "file",
                vec![Task::new("compliance"), Task::new("filing")],
            ));

        let report = orch.execute_workflow(wf).await;
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].step_name, "gather");
        assert_eq!(report.steps[1].step_type, StepMode::Sequential);
        assert_eq!(report.steps[1].results.len(), 2);
        assert_eq!(report.steps[1].results[1].agent_id.as_deref(), Some("file_001"));
    }
}
