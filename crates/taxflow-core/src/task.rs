use crate::error::{TaxflowError, TaxflowResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form key/value payload carried by tasks and success envelopes.
pub type Payload = serde_json::Map<String, Value>;

/// A single unit of work submitted to the orchestrator.
///
/// On the wire a task is a flat JSON object: `task_id` and `agent_type` are
/// optional keys and every other key belongs to the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-supplied identifier. The orchestrator synthesizes one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Routing key (`calculation`, `document`, `compliance`, `deduction`, `filing`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Variant-specific payload.
    #[serde(flatten)]
    pub payload: Payload,
}

impl Task {
    /// Creates an empty task routed by `agent_type`.
    pub fn new(agent_type: impl Into<String>) -> Self {
        Self {
            task_id: None,
            agent_type: Some(agent_type.into()),
            payload: Payload::new(),
        }
    }

    /// Sets an explicit task identifier.
    pub fn with_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Adds a payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Raw access to a payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Reads a string field, falling back to `default` when the key is absent
    /// or null. A present value of another JSON type is a payload error.
    pub fn str_or(&self, key: &str, default: &str) -> TaxflowResult<String> {
        match self.payload.get(key) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(type_mismatch(key, "a string", other)),
        }
    }

    /// Reads an object field, falling back to an empty object.
    pub fn object_or_empty(&self, key: &str) -> TaxflowResult<Payload> {
        match self.payload.get(key) {
            None | Some(Value::Null) => Ok(Payload::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(type_mismatch(key, "an object", other)),
        }
    }

    /// Reads an integer field, falling back to `default`.
    pub fn i64_or(&self, key: &str, default: i64) -> TaxflowResult<i64> {
        match self.payload.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| type_mismatch(key, "an integer", value)),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> TaxflowError {
    let kind = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    TaxflowError::Payload(format!("`{key}` must be {expected}, found {kind}"))
}
