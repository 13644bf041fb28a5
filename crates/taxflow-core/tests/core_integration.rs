#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use serde_json::json;
use taxflow_core::*;

// ---------------------------------------------------------------------------
// 1. Task built in code matches the task parsed from the wire
// ---------------------------------------------------------------------------

#[test]
fn builder_and_wire_tasks_agree() {
    let built = Task::new("calculation")
        .with_id("task-42")
        .with_field("data", json!({"income": 75000, "filing_status": "single"}));

    let parsed: Task = serde_json::from_value(json!({
        "task_id": "task-42",
        "agent_type": "calculation",
        "data": {"income": 75000, "filing_status": "single"}
    }))
    .unwrap();

    assert_eq!(built, parsed);
}

// ---------------------------------------------------------------------------
// 2. Envelope status drives the public predicates
// ---------------------------------------------------------------------------

#[test]
fn envelope_predicates() {
    let ok = Envelope::success("calc_001", 0, Payload::new());
    assert!(ok.is_success());
    assert!(!ok.is_error());

    let err = Envelope::error("boom");
    assert!(err.is_error());
    assert_eq!(err.status, EnvelopeStatus::Error);
}

// ---------------------------------------------------------------------------
// 3. A context provider can be used as a trait object
// ---------------------------------------------------------------------------

struct FixedContext;

#[async_trait]
impl ContextProvider for FixedContext {
    async fn ingest(&self, documents: &[String], _metadata: Option<&[Metadata]>) -> usize {
        documents.len()
    }

    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        _filter: Option<&Metadata>,
    ) -> Vec<ContextItem> {
        (0..k)
            .map(|i| ContextItem::new(format!("{query} #{i}"), Relevance::High))
            .collect()
    }
}

#[tokio::test]
async fn context_provider_trait_object() {
    let provider: std::sync::Arc<dyn ContextProvider> = std::sync::Arc::new(FixedContext);
    assert_eq!(provider.ingest(&["a".into(), "b".into()], None).await, 2);

    let items = provider.retrieve("standard deduction", 2, None).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].content, "standard deduction #1");

    let json = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(json["relevance"], "high");
}
