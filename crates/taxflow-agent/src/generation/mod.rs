/// Offline backend.
pub mod mock;
/// OpenAI-compatible HTTP backend.
pub mod openai;

use crate::config::{GenerationBackend, ModelConfig};
use async_trait::async_trait;
use std::sync::Arc;
use taxflow_core::TaxflowResult;

pub use mock::MockGeneration;
pub use openai::OpenAiGeneration;

/// Produces text from a prompt.
///
/// Each backend (mock, OpenAI-compatible) implements this trait. Agents hold
/// an `Arc<dyn GenerationProvider>` and treat an `Err` as an internal fault.
///
/// To add a backend:
/// 1. Create a module in `generation/`
/// 2. Implement `GenerationProvider` for it
/// 3. Add the variant to `GenerationBackend` in `config.rs`
/// 4. Wire it up in [`generation_from_config`]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> TaxflowResult<String>;

    /// Model identifier used for requests.
    fn model_id(&self) -> &str;
}

/// Builds the backend selected by `config.provider`.
pub fn generation_from_config(config: &ModelConfig) -> Arc<dyn GenerationProvider> {
    match config.provider {
        GenerationBackend::Mock => Arc::new(MockGeneration::new(config)),
        GenerationBackend::OpenAi => Arc::new(OpenAiGeneration::new(config.clone())),
    }
}
