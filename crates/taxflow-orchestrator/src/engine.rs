use crate::ledger::TaskLedger;
use crate::router::{standard_registry, Router};
use crate::types::{ActiveTask, CompletedTask, OrchestratorConfig, OrchestratorStatistics};
use futures_util::future::join_all;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taxflow_agent::{AgentStatusSnapshot, GenerationProvider, TaxAgent};
use taxflow_core::{ContextProvider, Envelope, Task, TaxflowResult};
use tokio::sync::Notify;
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Dispatches tasks to the agent registry and tracks their execution.
///
/// Cloning is cheap and every clone shares the same registry and ledger,
/// so a clone can be moved into a spawned task.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    router: Router,
    ledger: Mutex<TaskLedger>,
    drained: Notify,
    config: OrchestratorConfig,
    sequence: AtomicU64,
}

impl Orchestrator {
    /// Builds the five standard specialists over the given providers.
    pub fn new(
        config: OrchestratorConfig,
        context: Option<Arc<dyn ContextProvider>>,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        let agents = standard_registry(context, generation, config.retrieval_k);
        Self::with_agents(config, agents)
    }

    /// Uses a caller-supplied registry keyed by registry name.
    pub fn with_agents(
        config: OrchestratorConfig,
        agents: impl IntoIterator<Item = (String, Arc<dyn TaxAgent>)>,
    ) -> Self {
        let router = Router::new(agents);
        info!(
            agents = router.len(),
            max_parallel_agents = config.max_parallel_agents,
            "Orchestrator initialized"
        );
        Self {
            inner: Arc::new(Inner {
                router,
                ledger: Mutex::new(TaskLedger::new()),
                drained: Notify::new(),
                config,
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Looks up an agent by registry name.
    pub fn agent(&self, registry_name: &str) -> Option<Arc<dyn TaxAgent>> {
        self.inner.router.get(registry_name).cloned()
    }

    /// Routes `task` to its agent and executes it.
    ///
    /// Never fails: routing falls back to the calculator, and agent faults,
    /// including panics, come back as error envelopes carrying the task id.
    pub async fn route_and_execute(&self, task: Task) -> Envelope {
        let task_id = task
            .task_id
            .clone()
            .unwrap_or_else(|| self.next_task_id());

        let Some((_, agent)) = self.inner.router.route(task.agent_type.as_deref()) else {
            error!(task_id = %task_id, "No agents registered");
            return Envelope::error("no agents registered").with_task_id(task_id);
        };
        let agent = Arc::clone(agent);

        self.execute_task(agent, task, task_id).await
    }

    async fn execute_task(&self, agent: Arc<dyn TaxAgent>, task: Task, task_id: String) -> Envelope {
        let entry = match ActiveEntry::begin(&self.inner, &task_id, agent.name()) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Rejected task");
                return Envelope::error(e.to_string()).with_task_id(&task_id);
            }
        };
        debug!(task_id = %task_id, agent = agent.name(), "Task started");

        let outcome = AssertUnwindSafe(agent.process(&task)).catch_unwind().await;

        match outcome {
            Ok(envelope) => {
                let envelope = envelope.with_task_id(&task_id);
                entry.complete(envelope.clone());
                envelope
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(task_id = %task_id, agent = agent.name(), error = %message, "Task execution failed");
                entry.abandon();
                Envelope::error(message).with_task_id(&task_id)
            }
        }
    }

    /// Executes `tasks` concurrently and returns one envelope per task in
    /// input order.
    pub async fn execute_parallel(&self, tasks: Vec<Task>) -> Vec<Envelope> {
        info!(count = tasks.len(), "Processing tasks in parallel");

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let this = self.clone();
                tokio::spawn(async move { this.route_and_execute(task).await })
            })
            .collect();

        let results: Vec<Envelope> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, joined)| joined_envelope(i, joined))
            .collect();

        info!(count = results.len(), "Completed tasks");
        results
    }

    /// Status of every agent keyed by registry name.
    pub async fn agent_status(&self) -> BTreeMap<String, AgentStatusSnapshot> {
        let mut status = BTreeMap::new();
        for (name, agent) in self.inner.router.iter() {
            status.insert(name.clone(), agent.status().await);
        }
        status
    }

    /// Counters plus agent status.
    pub async fn statistics(&self) -> OrchestratorStatistics {
        let (active_tasks, completed_tasks) = {
            let ledger = self.inner.ledger.lock();
            (ledger.active_count(), ledger.completed_count())
        };
        OrchestratorStatistics {
            total_agents: self.inner.router.len(),
            max_parallel_agents: self.inner.config.max_parallel_agents,
            active_tasks,
            completed_tasks,
            agent_status: self.agent_status().await,
        }
    }

    /// Snapshot of the active task table.
    pub async fn active_tasks(&self) -> HashMap<String, ActiveTask> {
        self.inner.ledger.lock().active()
    }

    /// Snapshot of the completed log, oldest first.
    pub async fn completed_tasks(&self) -> Vec<CompletedTask> {
        self.inner.ledger.lock().completed()
    }

    /// Waits up to `shutdown_grace_ms` for in-flight tasks, then resets
    /// every agent.
    pub async fn shutdown(&self) {
        info!("Shutting down orchestrator");

        let active = self.inner.ledger.lock().active_count();
        if active > 0 {
            info!(active, "Waiting for active tasks");
            let grace = Duration::from_millis(self.inner.config.shutdown_grace_ms);
            if tokio::time::timeout(grace, self.wait_drained()).await.is_err() {
                let remaining = self.inner.ledger.lock().active_count();
                warn!(remaining, "Grace period elapsed with tasks still active");
            }
        }

        for (_, agent) in self.inner.router.iter() {
            agent.reset().await;
        }

        info!("Orchestrator shutdown complete");
    }

    async fn wait_drained(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.inner.ledger.lock().active_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn next_task_id(&self) -> String {
        let seq = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        format!("task_{}_{seq}", chrono::Utc::now().timestamp_micros())
    }
}

/// An active-table entry owned by one execution.
///
/// Dropping it without [`ActiveEntry::complete`] removes the entry without
/// logging a completion, so a cancelled caller future cannot leak it.
struct ActiveEntry<'a> {
    inner: &'a Inner,
    task_id: &'a str,
    settled: bool,
}

impl<'a> ActiveEntry<'a> {
    fn begin(inner: &'a Inner, task_id: &'a str, agent: &str) -> TaxflowResult<Self> {
        inner.ledger.lock().begin(task_id, agent)?;
        Ok(Self {
            inner,
            task_id,
            settled: false,
        })
    }

    fn complete(mut self, result: Envelope) {
        self.inner.ledger.lock().complete(self.task_id, result);
        self.settled = true;
    }

    fn abandon(mut self) {
        self.inner.ledger.lock().abandon(self.task_id);
        self.settled = true;
    }
}

impl Drop for ActiveEntry<'_> {
    fn drop(&mut self) {
        let mut ledger = self.inner.ledger.lock();
        if !self.settled && ledger.abandon(self.task_id) {
            warn!(task_id = %self.task_id, "Task dropped before completion");
        }
        if ledger.active_count() == 0 {
            self.inner.drained.notify_waiters();
        }
    }
}

/// Result slot of one fan-out task. The join only fails when the spawned
/// task itself was cancelled or panicked outside the executor's own
/// panic capture.
fn joined_envelope(index: usize, joined: Result<Envelope, JoinError>) -> Envelope {
    match joined {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(task_index = index, error = %e, "Task failed with exception");
            Envelope::error(e.to_string()).with_task_index(index)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
