use crate::generation::GenerationProvider;
use crate::specialists::Specialty;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use taxflow_core::{ContextItem, ContextProvider, Envelope, Task, TaxflowResult};
use tracing::{error, info, warn};

/// Default number of context items requested per task.
pub const DEFAULT_RETRIEVAL_K: usize = 5;

/// Lifecycle state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Freshly built or reset.
    Initialized,
    /// A task is in flight.
    Processing,
    /// Last task succeeded.
    Idle,
    /// Last task failed.
    Error,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "initialized",
            Self::Processing => "processing",
            Self::Idle => "idle",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusSnapshot {
    /// Stable agent id.
    pub agent_id: String,
    /// Display name.
    pub agent_name: String,
    /// Current lifecycle state.
    pub status: AgentStatus,
    /// Successful tasks recorded since construction or the last reset.
    pub tasks_completed: usize,
    /// Capability tags.
    pub capabilities: Vec<String>,
}

/// One entry of an agent's task history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// When the task finished.
    pub timestamp: DateTime<Utc>,
    /// The task as received.
    pub task: Task,
    /// The envelope returned.
    pub result: Envelope,
    /// Agent that handled it.
    pub agent_id: String,
}

/// Contract every worker in the registry satisfies.
///
/// `process` never fails outward: faults inside the pipeline come back as
/// an error [`Envelope`] and move the agent to [`AgentStatus::Error`].
#[async_trait]
pub trait TaxAgent: Send + Sync {
    /// Stable identifier, e.g. `calc_001`.
    fn id(&self) -> &str;

    /// Display name, e.g. `Tax Calculator Agent`.
    fn name(&self) -> &str;

    /// Capability tags.
    fn capabilities(&self) -> Vec<String>;

    /// Handles one task.
    async fn process(&self, task: &Task) -> Envelope;

    /// Current status snapshot.
    async fn status(&self) -> AgentStatusSnapshot;

    /// Completed task records, oldest first.
    async fn history(&self) -> Vec<TaskRecord>;

    /// Clears history and returns to [`AgentStatus::Initialized`].
    async fn reset(&self);
}

struct AgentState {
    status: AgentStatus,
    history: Vec<TaskRecord>,
}

/// A [`TaxAgent`] whose domain logic is supplied by a [`Specialty`].
///
/// The shared pipeline is: build a retrieval query, fetch context, render
/// the prompt with that context, generate, then shape the success envelope.
pub struct SpecialistAgent<S> {
    agent_id: String,
    specialty: S,
    context: Option<Arc<dyn ContextProvider>>,
    generation: Arc<dyn GenerationProvider>,
    retrieval_k: usize,
    state: Mutex<AgentState>,
}

impl<S: Specialty> SpecialistAgent<S> {
    /// Creates an agent with no context provider.
    pub fn new(
        agent_id: impl Into<String>,
        specialty: S,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        let agent_id = agent_id.into();
        info!(agent_id = %agent_id, agent_name = specialty.agent_name(), "Agent initialized");
        Self {
            agent_id,
            specialty,
            context: None,
            generation,
            retrieval_k: DEFAULT_RETRIEVAL_K,
            state: Mutex::new(AgentState {
                status: AgentStatus::Initialized,
                history: Vec::new(),
            }),
        }
    }

    /// Attaches the context provider consulted before every generation.
    pub fn with_context(mut self, context: Arc<dyn ContextProvider>) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets how many context items each task requests.
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    async fn retrieve_context(&self, query: &str) -> Vec<ContextItem> {
        let Some(provider) = &self.context else {
            warn!(agent_id = %self.agent_id, "Agent has no context provider");
            return Vec::new();
        };
        let items = provider.retrieve(query, self.retrieval_k, None).await;
        info!(agent_id = %self.agent_id, retrieved = items.len(), "Retrieved context");
        items
    }

    async fn run(&self, task: &Task) -> TaxflowResult<Envelope> {
        let plan = self.specialty.plan(task)?;
        let context = self.retrieve_context(&plan.query).await;
        let prompt = build_prompt_with_context(&plan.prompt, &context);
        let generated = self.generation.generate(&prompt).await?;

        let mut output = plan.output;
        output.insert(plan.result_key.to_string(), generated.into());
        Ok(Envelope::success(&self.agent_id, context.len(), output))
    }
}

#[async_trait]
impl<S: Specialty> TaxAgent for SpecialistAgent<S> {
    fn id(&self) -> &str {
        &self.agent_id
    }

    fn name(&self) -> &str {
        self.specialty.agent_name()
    }

    fn capabilities(&self) -> Vec<String> {
        self.specialty
            .capabilities()
            .iter()
            .map(|c| (*c).to_string())
            .collect()
    }

    async fn process(&self, task: &Task) -> Envelope {
        let processing = Processing::start(&self.state, &self.agent_id);

        match self.run(task).await {
            Ok(envelope) => {
                let mut state = processing.settle();
                state.history.push(TaskRecord {
                    timestamp: Utc::now(),
                    task: task.clone(),
                    result: envelope.clone(),
                    agent_id: self.agent_id.clone(),
                });
                state.status = AgentStatus::Idle;
                info!(
                    agent_id = %self.agent_id,
                    tasks_completed = state.history.len(),
                    "Task completed"
                );
                envelope
            }
            Err(e) => {
                error!(agent_id = %self.agent_id, error = %e, "Task processing failed");
                processing.settle().status = AgentStatus::Error;
                Envelope::agent_error(&self.agent_id, &e)
            }
        }
    }

    async fn status(&self) -> AgentStatusSnapshot {
        let state = self.state.lock();
        AgentStatusSnapshot {
            agent_id: self.agent_id.clone(),
            agent_name: self.name().to_string(),
            status: state.status,
            tasks_completed: state.history.len(),
            capabilities: self.capabilities(),
        }
    }

    async fn history(&self) -> Vec<TaskRecord> {
        self.state.lock().history.clone()
    }

    async fn reset(&self) {
        let mut state = self.state.lock();
        state.status = AgentStatus::Initialized;
        state.history.clear();
        info!(agent_id = %self.agent_id, "Agent reset");
    }
}

/// Marks an agent as processing for the lifetime of one `process` call.
///
/// If the call is dropped before it settles, a status still reading
/// `Processing` falls back to `Idle` and no history is recorded.
struct Processing<'a> {
    state: &'a Mutex<AgentState>,
    agent_id: &'a str,
    settled: bool,
}

impl<'a> Processing<'a> {
    fn start(state: &'a Mutex<AgentState>, agent_id: &'a str) -> Self {
        state.lock().status = AgentStatus::Processing;
        Self {
            state,
            agent_id,
            settled: false,
        }
    }

    fn settle(mut self) -> parking_lot::MutexGuard<'a, AgentState> {
        self.settled = true;
        self.state.lock()
    }
}

impl Drop for Processing<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock();
        if state.status == AgentStatus::Processing {
            state.status = AgentStatus::Idle;
            warn!(agent_id = %self.agent_id, "Task cancelled");
        }
    }
}

/// Renders `prompt` under a context preamble. Without context the prompt is
/// returned unchanged.
pub fn build_prompt_with_context(prompt: &str, context: &[ContextItem]) -> String {
    if context.is_empty() {
        return prompt.to_string();
    }

    let context_text = context
        .iter()
        .enumerate()
        .map(|(i, item)| format!("Context {}:\n{}", i + 1, item.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following context, answer the question.\n\n\
         Context:\n{context_text}\n\n\
         Question: {prompt}\n\n\
         Answer:"
    )
}
