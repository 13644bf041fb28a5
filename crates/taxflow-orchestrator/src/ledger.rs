use crate::types::{ActiveTask, CompletedTask, RunStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use taxflow_core::{Envelope, TaxflowError, TaxflowResult};

/// Active task table plus the append-only completed log.
///
/// A task id lives in at most one of the two: [`TaskLedger::complete`]
/// removes the active entry before appending to the log.
#[derive(Debug, Default)]
pub struct TaskLedger {
    active: HashMap<String, ActiveTask>,
    completed: Vec<CompletedTask>,
}

impl TaskLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `task_id` as running on `agent` and returns its start time.
    ///
    /// Fails when the id is already active.
    pub fn begin(&mut self, task_id: &str, agent: &str) -> TaxflowResult<DateTime<Utc>> {
        if self.active.contains_key(task_id) {
            return Err(TaxflowError::Orchestrator(format!(
                "task_id {task_id} is already active"
            )));
        }
        let start_time = Utc::now();
        self.active.insert(
            task_id.to_string(),
            ActiveTask {
                agent: agent.to_string(),
                start_time,
                status: RunStatus::Running,
            },
        );
        Ok(start_time)
    }

    /// Moves `task_id` from the active table into the completed log.
    pub fn complete(&mut self, task_id: &str, result: Envelope) {
        let Some(active) = self.active.remove(task_id) else {
            return;
        };
        self.completed.push(CompletedTask {
            task_id: task_id.to_string(),
            agent: active.agent,
            start_time: active.start_time,
            end_time: Utc::now(),
            result,
        });
    }

    /// Drops the active entry without logging a completion.
    pub fn abandon(&mut self, task_id: &str) -> bool {
        self.active.remove(task_id).is_some()
    }

    /// True while `task_id` is executing.
    pub fn is_active(&self, task_id: &str) -> bool {
        self.active.contains_key(task_id)
    }

    /// Number of executing tasks.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of logged completions.
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Copy of the active table.
    pub fn active(&self) -> HashMap<String, ActiveTask> {
        self.active.clone()
    }

    /// Copy of the completed log, oldest first.
    pub fn completed(&self) -> Vec<CompletedTask> {
        self.completed.clone()
    }
}
