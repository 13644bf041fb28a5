//! Layered configuration: defaults, then an optional TOML file, then `.env`
//! and process environment overrides.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use taxflow_agent::{GenerationBackend, ModelConfig};
use taxflow_core::{TaxflowError, TaxflowResult};
use taxflow_orchestrator::OrchestratorConfig;
use taxflow_rag::RagConfig;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "taxflow.toml";

/// Environment variables and the dotted keys they override.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "model.api_key"),
    ("OPENAI_BASE_URL", "model.api_base_url"),
    ("TAXFLOW_PROVIDER", "model.provider"),
    ("TAXFLOW_MODEL", "model.model_id"),
    ("MAX_PARALLEL_AGENTS", "orchestrator.max_parallel_agents"),
    ("TAX_DOCUMENTS_PATH", "paths.tax_documents"),
    ("TAX_RULES_PATH", "paths.tax_rules"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FILE", "logging.file"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxflowConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_tax_documents")]
    pub tax_documents: PathBuf,
    #[serde(default = "default_tax_rules")]
    pub tax_rules: PathBuf,
}

fn default_tax_documents() -> PathBuf {
    PathBuf::from("./data/tax_documents")
}

fn default_tax_rules() -> PathBuf {
    PathBuf::from("./data/tax_rules")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tax_documents: default_tax_documents(),
            tax_rules: default_tax_rules(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `taxflow_orchestrator=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write logs to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// JSON lines on stderr instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
        }
    }
}

impl TaxflowConfig {
    /// Builds the effective configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read when present. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> TaxflowResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(dotenv) = dotenvy::dotenv() {
            debug!(path = %dotenv.display(), "Loaded .env");
        }
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parses a TOML file; missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> TaxflowResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TaxflowError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|e| TaxflowError::Config(format!("invalid '{}': {e}", path.display())))
    }

    /// Applies [`ENV_OVERRIDES`] using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> TaxflowResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var) {
                debug!(var, key, "Applying environment override");
                self.set(key, &value)?;
            }
        }
        Ok(())
    }

    /// Updates a single dotted key such as `orchestrator.retrieval_k`.
    pub fn set(&mut self, key: &str, value: &str) -> TaxflowResult<()> {
        match key {
            "model.provider" => {
                self.model.provider = match value.to_ascii_lowercase().as_str() {
                    "mock" => GenerationBackend::Mock,
                    "openai" => GenerationBackend::OpenAi,
                    other => {
                        return Err(TaxflowError::Config(format!(
                            "unknown provider '{other}' (expected mock or openai)"
                        )))
                    }
                };
            }
            "model.model_id" => self.model.model_id = value.to_string(),
            "model.api_key" => self.model.api_key = value.to_string(),
            "model.api_base_url" => self.model.api_base_url = non_empty(value),
            "model.temperature" => self.model.temperature = parse(key, value)?,
            "model.max_tokens" => self.model.max_tokens = parse(key, value)?,
            "model.mock_latency_ms" => self.model.mock_latency_ms = parse(key, value)?,
            "orchestrator.max_parallel_agents" => {
                self.orchestrator.max_parallel_agents = parse(key, value)?;
            }
            "orchestrator.retrieval_k" => self.orchestrator.retrieval_k = parse(key, value)?,
            "orchestrator.shutdown_grace_ms" => {
                self.orchestrator.shutdown_grace_ms = parse(key, value)?;
            }
            "rag.chunk_size" => self.rag.chunk_size = parse(key, value)?,
            "rag.chunk_overlap" => self.rag.chunk_overlap = parse(key, value)?,
            "rag.embedding_dimension" => self.rag.embedding_dimension = parse(key, value)?,
            "paths.tax_documents" => self.paths.tax_documents = PathBuf::from(value),
            "paths.tax_rules" => self.paths.tax_rules = PathBuf::from(value),
            "logging.level" => self.logging.level = value.to_ascii_lowercase(),
            "logging.file" => self.logging.file = non_empty(value).map(PathBuf::from),
            "logging.json" => self.logging.json = parse(key, value)?,
            _ => return Err(TaxflowError::Config(format!("unknown config key '{key}'"))),
        }
        Ok(())
    }

    /// Rejects combinations the runtime cannot work with.
    pub fn validate(&self) -> TaxflowResult<()> {
        if self.orchestrator.max_parallel_agents == 0 {
            return Err(TaxflowError::Config(
                "orchestrator.max_parallel_agents must be at least 1".into(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(TaxflowError::Config(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.model.provider == GenerationBackend::OpenAi && self.model.api_key.is_empty() {
            return Err(TaxflowError::Config(
                "the openai provider requires model.api_key (or OPENAI_API_KEY)".into(),
            ));
        }
        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> TaxflowResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| TaxflowError::Config(format!("invalid value '{value}' for {key}: {e}")))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
