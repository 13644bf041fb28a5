use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use taxflow_agent::AgentStatusSnapshot;
use taxflow_core::{Envelope, Task};

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Advertised concurrency cap. Reported in statistics, not enforced.
    #[serde(default = "default_max_parallel_agents")]
    pub max_parallel_agents: usize,
    /// Context items each agent requests per task.
    #[serde(default = "default_retrieval_k")]
    pub retrieval_k: usize,
    /// How long `shutdown` waits for in-flight tasks before resetting agents.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_max_parallel_agents() -> usize {
    5
}

fn default_retrieval_k() -> usize {
    5
}

fn default_shutdown_grace_ms() -> u64 {
    1000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_parallel_agents: default_max_parallel_agents(),
            retrieval_k: default_retrieval_k(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

/// How the tasks of a [`Step`] are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// All tasks at once, results in input order.
    #[default]
    Parallel,
    /// One task at a time, in list order.
    Sequential,
}

impl std::fmt::Display for StepMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepMode::Parallel => write!(f, "parallel"),
            StepMode::Sequential => write!(f, "sequential"),
        }
    }
}

/// A named group of tasks executed together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step name.
    #[serde(default = "default_step_name")]
    pub name: String,
    /// Execution mode; `type` on the wire.
    #[serde(rename = "type", default)]
    pub mode: StepMode,
    /// Tasks in input order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_step_name() -> String {
    "unnamed_step".to_string()
}

impl Step {
    /// A step whose tasks run concurrently.
    pub fn parallel(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            mode: StepMode::Parallel,
            tasks,
        }
    }

    /// A step whose tasks run one after another.
    pub fn sequential(name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            name: name.into(),
            mode: StepMode::Sequential,
            tasks,
        }
    }
}

/// An ordered sequence of steps executed as one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow name.
    #[serde(default = "default_workflow_name")]
    pub name: String,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_workflow_name() -> String {
    "unnamed".to_string()
}

impl Workflow {
    /// An empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// Results of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Name of the step.
    pub step_name: String,
    /// Mode it ran in.
    pub step_type: StepMode,
    /// One envelope per task, in input order.
    pub results: Vec<Envelope>,
}

/// Final state of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Every step ran. Individual task failures live in the step results.
    Completed,
}

/// Aggregated workflow output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// Name of the workflow.
    pub workflow_name: String,
    /// When the first step started.
    pub start_time: DateTime<Utc>,
    /// When the last step finished.
    pub end_time: DateTime<Utc>,
    /// Always [`WorkflowStatus::Completed`].
    pub status: WorkflowStatus,
    /// Step reports in execution order.
    pub steps: Vec<StepReport>,
}

/// Run state of an active task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The agent is processing the task.
    Running,
}

/// Entry of the active task table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Name of the agent handling the task.
    pub agent: String,
    /// When execution began.
    pub start_time: DateTime<Utc>,
    /// Run state.
    pub status: RunStatus,
}

/// Entry of the completed task log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    /// Task identifier.
    pub task_id: String,
    /// Name of the agent that handled it.
    pub agent: String,
    /// When execution began.
    pub start_time: DateTime<Utc>,
    /// When the envelope was recorded.
    pub end_time: DateTime<Utc>,
    /// Envelope returned to the caller.
    pub result: Envelope,
}

/// Orchestrator-wide counters plus every agent's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatistics {
    /// Registered agents.
    pub total_agents: usize,
    /// Configured concurrency cap (advisory).
    pub max_parallel_agents: usize,
    /// Tasks currently executing.
    pub active_tasks: usize,
    /// Entries in the completed log.
    pub completed_tasks: usize,
    /// Status per registry name.
    pub agent_status: BTreeMap<String, AgentStatusSnapshot>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_workflow_wire_defaults() {
        let wf: Workflow = serde_json::from_value(json!({
            "steps": [
                {"tasks": [{"agent_type": "document"}]},
                {"name": "filing", "type": "sequential", "tasks": []}
            ]
        }))
        .unwrap();

        assert_eq!(wf.name, "unnamed");
        assert_eq!(wf.steps[0].name, "unnamed_step");
        assert_eq!(wf.steps[0].mode, StepMode::Parallel);
        assert_eq!(wf.steps[0].tasks[0].agent_type.as_deref(), Some("document"));
        assert_eq!(wf.steps[1].mode, StepMode::Sequential);
    }

    #[test]
    fn test_step_builders_serialize_type_key() {
        let step = Step::sequential("prepare", vec![Task::new("filing")]);
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "sequential");
        assert_eq!(value["tasks"][0]["agent_type"], "filing");
    }

    #[test]
    fn test_config_defaults() {
        let config: OrchestratorConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.max_parallel_agents, 5);
        assert_eq!(config.shutdown_grace_ms, 1000);
    }

    #[test]
    fn test_report_status_serializes_completed() {
        let now = Utc::now();
        let report = WorkflowReport {
            workflow_name: "annual".into(),
            start_time: now,
            end_time: now,
            status: WorkflowStatus::Completed,
            steps: vec![],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["workflow_name"], "annual");
    }
}
