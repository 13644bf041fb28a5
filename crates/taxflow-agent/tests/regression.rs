//! Regression tests for taxflow-agent: ModelConfig, generation backends, specialist agents.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use std::sync::Arc;
use taxflow_agent::*;
use taxflow_core::{ContextProvider, Task};
use taxflow_rag::{RagConfig, TaxDocumentRag};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instant() -> Arc<dyn GenerationProvider> {
    generation_from_config(&ModelConfig::instant_mock())
}

fn openai_config(base: &str) -> ModelConfig {
    ModelConfig {
        provider: GenerationBackend::OpenAi,
        model_id: "gpt-4o-mini".into(),
        api_key: "sk-test".into(),
        api_base_url: Some(base.to_string()),
        ..ModelConfig::default()
    }
}

// --- ModelConfig ---

#[test]
fn test_model_config_toml_defaults() {
    let config: ModelConfig = toml::from_str(r#"provider = "openai""#).unwrap();
    assert_eq!(config.provider, GenerationBackend::OpenAi);
    assert_eq!(config.model_id, "gpt-4");
    assert_eq!(config.mock_latency_ms, 100);
    assert!(config.api_key.is_empty());
}

#[test]
fn test_model_config_toml_full() {
    let config: ModelConfig = toml::from_str(
        r#"
        provider = "mock"
        model_id = "local"
        temperature = 0.2
        max_tokens = 512
        mock_latency_ms = 0
    "#,
    )
    .unwrap();
    assert_eq!(config.model_id, "local");
    assert_eq!(config.max_tokens, 512);
    assert_eq!(config.mock_latency_ms, 0);
}

// --- OpenAI-compatible backend ---

#[tokio::test]
async fn test_openai_generation_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Tax owed: $8,500"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = generation_from_config(&openai_config(&server.uri()));
    let out = backend.generate("Calculate taxes").await.unwrap();
    assert_eq!(out, "Tax owed: $8,500");
}

#[tokio::test]
async fn test_openai_error_status_is_http_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let backend = OpenAiGeneration::new(openai_config(&server.uri()));
    let err = backend.generate("x").await.unwrap_err();
    assert!(err.to_string().starts_with("HTTP error"));
    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn test_agent_with_failing_backend_returns_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let agent = FilingAssistantAgent::new(
        "file_001",
        FilingAssistance,
        generation_from_config(&openai_config(&server.uri())),
    );
    let env = agent.process(&Task::new("filing")).await;
    assert!(env.is_error());
    assert_eq!(env.agent_id.as_deref(), Some("file_001"));
    assert_eq!(agent.status().await.status, AgentStatus::Error);
}

// --- Specialist envelopes ---

#[tokio::test]
async fn test_each_specialty_envelope_shape() {
    let calc = TaxCalculatorAgent::new("calc_001", Calculation, instant());
    let env = calc
        .process(&Task::new("calculation").with_field("data", json!({"income": 75000})))
        .await;
    assert_eq!(env.get_str("task_type"), Some("general_calculation"));
    assert!(!env.get_str("calculation").unwrap().is_empty());

    let doc = DocumentAnalyzerAgent::new("doc_001", DocumentAnalysis, instant());
    let env = doc
        .process(
            &Task::new("document")
                .with_field("document_type", "W-2")
                .with_field("content", "Wages 75000"),
        )
        .await;
    assert_eq!(env.get_str("document_type"), Some("W-2"));
    assert_eq!(env.get("extracted_fields").unwrap()["field_count"], 2);
    assert!(env.get_str("analysis").is_some());

    let comp = ComplianceCheckerAgent::new("comp_001", ComplianceCheck, instant());
    let env = comp.process(&Task::new("compliance")).await;
    assert_eq!(env.get_str("jurisdiction"), Some("federal"));
    assert_eq!(env.get_str("compliance_status"), Some("compliant"));
    assert!(env.get_str("report").is_some());

    let deduct = DeductionOptimizerAgent::new("deduct_001", DeductionOptimization, instant());
    let env = deduct.process(&Task::new("deduction")).await;
    assert_eq!(env.get("tax_year"), Some(&json!(2024)));
    assert_eq!(env.get_str("potential_savings"), Some("calculated_savings"));
    assert!(env.get_str("optimization_suggestions").is_some());

    let filing = FilingAssistantAgent::new("file_001", FilingAssistance, instant());
    let env = filing.process(&Task::new("filing")).await;
    assert_eq!(env.get("forms_prepared"), Some(&json!(["1040"])));
    assert!(env.get_str("guidance").is_some());
}

#[tokio::test]
async fn test_capabilities_are_reported() {
    let agent = DocumentAnalyzerAgent::new("doc_001", DocumentAnalysis, instant());
    let snap = agent.status().await;
    assert_eq!(snap.capabilities.len(), 6);
    assert!(snap.capabilities.contains(&"w2_form_analysis".to_string()));

    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["status"], "initialized");
    assert_eq!(json["tasks_completed"], 0);
}

// --- With a real retrieval backend ---

#[tokio::test]
async fn test_agent_uses_rag_context() {
    let rag = Arc::new(TaxDocumentRag::new(&RagConfig::default()).unwrap());
    rag.ingest(
        &[
            "Tax filing instructions for form 1040: attach Schedule 1 for additional income."
                .to_string(),
        ],
        None,
    )
    .await;

    let agent = FilingAssistantAgent::new("file_001", FilingAssistance, instant())
        .with_context(rag)
        .with_retrieval_k(3);
    let env = agent.process(&Task::new("filing")).await;
    assert!(env.is_success());
    assert_eq!(env.context_used, Some(1));
}
