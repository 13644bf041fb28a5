use thiserror::Error;

/// A convenience `Result` alias using [`TaxflowError`].
pub type TaxflowResult<T> = Result<T, TaxflowError>;

/// Top-level error type shared by every taxflow crate.
///
/// Errors never cross the orchestrator's public surface: agents and the
/// orchestrator convert them into [`crate::Envelope::error`] values.
#[derive(Error, Debug)]
pub enum TaxflowError {
    /// The task payload did not have the shape the agent expects.
    #[error("Invalid payload: {0}")]
    Payload(String),

    /// Chunking, embedding or vector search failed.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// The generation provider could not produce an output.
    #[error("Generation error: {0}")]
    Generation(String),

    /// An outbound HTTP request failed (e.g. an LLM API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration parsing or validation failed.
    #[error("Config error: {0}")]
    Config(String),

    /// A fault raised by the orchestrator itself.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
