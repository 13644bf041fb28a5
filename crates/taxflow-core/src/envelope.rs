use crate::error::TaxflowError;
use crate::task::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome tag carried by every [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// The task produced a result.
    Success,
    /// The task failed; see [`Envelope::error`].
    Error,
}

/// Uniform result shape returned for every task, successful or not.
///
/// Serializes as one flat JSON object: the fixed keys below plus the
/// variant-specific output keys (e.g. `calculation`, `analysis`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Success or error.
    pub status: EnvelopeStatus,
    /// The agent that produced the envelope, when one was reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Set by the orchestrator once the task has an identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Input position, set only by the fan-out layer for faults it caught.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_index: Option<usize>,
    /// Number of context items the agent retrieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_used: Option<usize>,
    /// Human-readable failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Variant-specific output fields.
    #[serde(flatten)]
    pub output: Payload,
}

impl Envelope {
    /// Builds a success envelope.
    pub fn success(agent_id: impl Into<String>, context_used: usize, output: Payload) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            agent_id: Some(agent_id.into()),
            task_id: None,
            task_index: None,
            context_used: Some(context_used),
            error: None,
            output,
        }
    }

    /// Builds an error envelope not attributed to any agent.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            agent_id: None,
            task_id: None,
            task_index: None,
            context_used: None,
            error: Some(message.into()),
            output: Payload::new(),
        }
    }

    /// Builds an error envelope from a fault caught inside an agent.
    pub fn agent_error(agent_id: impl Into<String>, err: &TaxflowError) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            ..Self::error(err.to_string())
        }
    }

    /// Annotates the envelope with its task identifier.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Annotates the envelope with its position in a fan-out.
    pub fn with_task_index(mut self, index: usize) -> Self {
        self.task_index = Some(index);
        self
    }

    /// True for [`EnvelopeStatus::Success`].
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    /// True for [`EnvelopeStatus::Error`].
    pub fn is_error(&self) -> bool {
        self.status == EnvelopeStatus::Error
    }

    /// Looks up a variant-specific output field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.output.get(key)
    }

    /// Looks up a variant-specific output field holding a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.output.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_is_flat() {
        let mut output = Payload::new();
        output.insert("calculation".into(), json!("owed: $12,000"));
        let env = Envelope::success("calc_001", 3, output).with_task_id("t-1");

        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["agent_id"], "calc_001");
        assert_eq!(value["task_id"], "t-1");
        assert_eq!(value["context_used"], 3);
        assert_eq!(value["calculation"], "owed: $12,000");
        assert!(value.get("error").is_none());
        assert!(value.get("task_index").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let env = Envelope::error("boom").with_task_index(2);
        assert!(env.is_error());
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
        assert_eq!(value["task_index"], 2);
        assert!(value.get("agent_id").is_none());
    }

    #[test]
    fn test_agent_error_keeps_agent_id() {
        let err = TaxflowError::Generation("provider unavailable".into());
        let env = Envelope::agent_error("doc_001", &err);
        assert_eq!(env.agent_id.as_deref(), Some("doc_001"));
        assert_eq!(
            env.error.as_deref(),
            Some("Generation error: provider unavailable")
        );
    }

    #[test]
    fn test_unknown_keys_land_in_output() {
        let env: Envelope = serde_json::from_value(json!({
            "status": "success",
            "agent_id": "file_001",
            "context_used": 0,
            "guidance": "attach schedule C"
        }))
        .unwrap();
        assert!(env.is_success());
        assert_eq!(env.get_str("guidance"), Some("attach schedule C"));
        assert_eq!(env.context_used, Some(0));
    }
}
