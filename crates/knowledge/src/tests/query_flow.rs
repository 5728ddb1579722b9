use super::*;
use crate::orchestrator::RetrievalOrchestrator;
use crate::summary::FAILURE_PLACEHOLDER;
use crate::types::{QueryOutcome, QueryState};
use edurag_llm::{LlmClient, LlmRequest, LlmResponse, MockClient, MockReply};
use std::sync::Arc;
use std::time::Duration;

const GENERATED: &str = r#"{
    "title": "Hybrid Learning Models in K-12",
    "content": "A survey of hybrid classrooms and their outcomes.",
    "keywords": ["hybrid learning"],
    "category": "Technology",
    "publisher": "Education Institute",
    "url": "https://example.org/hybrid"
}"#;

fn is_expansion(request: &LlmRequest) -> bool {
    request.response_schema.is_some()
}

fn build(
    store: Arc<dyn DocumentStore>,
    llm: Arc<MockClient>,
    settings: RagSettings,
) -> RetrievalOrchestrator {
    let orchestrator =
        RetrievalOrchestrator::new(store, llm, "gemini-test", settings, None).unwrap();
    orchestrator.mark_ready();
    orchestrator
}

#[tokio::test]
async fn test_matching_document_is_summarized() {
    let store = Arc::new(InMemoryStore::from_documents(vec![document(
        "r1",
        "Phonics review",
        "Phonics instruction improves early reading.",
        Some(term_vector(&[("phonics", 3), ("reading", 2), ("literacy", 1)])),
    )]));
    let llm = Arc::new(MockClient::new().with_handler(|_| MockReply::text("Phonics helps.")));
    let settings = RagSettings {
        similarity_threshold: 0.2,
        ..fast_settings()
    };

    let response = build(store, llm.clone(), settings)
        .search("phonics reading")
        .await
        .unwrap();

    assert_eq!(response.outcome, QueryOutcome::Found);
    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].score > 0.2);
    assert_eq!(response.results[0].summary.as_deref(), Some("Phonics helps."));
    assert_eq!(
        response.path,
        vec![
            QueryState::Idle,
            QueryState::Vectorizing,
            QueryState::Scanning,
            QueryState::Ranking,
            QueryState::Synthesizing,
            QueryState::Done,
        ]
    );
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_empty_store_without_expansion_result() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockClient::new().with_handler(|_| MockReply::status(500)));
    let orchestrator = build(store.clone(), llm.clone(), fast_settings());

    let response = orchestrator.search("phonics reading").await.unwrap();

    assert_eq!(response.outcome, QueryOutcome::NoDataFound);
    assert!(response.results.is_empty());
    assert!(response.expanded());
    assert_eq!(response.path.last(), Some(&QueryState::Done));
    assert!(!response.path.contains(&QueryState::Ranking));

    // Three expansion attempts, no summaries
    assert_eq!(llm.calls(), 3);
    assert!(store.is_empty());
    assert!(!orchestrator.is_expanding());
}

#[tokio::test]
async fn test_expansion_persists_and_summarizes() {
    let store = Arc::new(InMemoryStore::new());
    let llm = Arc::new(MockClient::new().with_handler(|request| {
        if is_expansion(request) {
            MockReply::text(GENERATED)
        } else {
            MockReply::text("Hybrid models raise engagement.")
        }
    }));

    let response = build(store.clone(), llm.clone(), fast_settings())
        .search("hybrid learning")
        .await
        .unwrap();

    assert_eq!(response.outcome, QueryOutcome::Found);
    assert!(response.expanded());
    assert_eq!(response.results.len(), 1);

    let result = &response.results[0];
    assert_eq!(result.document.title, "Hybrid Learning Models in K-12");
    assert!(result.score > 0.0);
    assert_eq!(result.summary.as_deref(), Some("Hybrid models raise engagement."));

    let stored = store.scan_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, result.document.id);
    assert!(stored[0].vector.is_some());
    assert_eq!(llm.calls(), 2);
}

#[tokio::test]
async fn test_unpersisted_expansion_is_dropped() {
    let store = Arc::new(FlakyStore::new(vec![]).failing_inserts());
    let llm = Arc::new(MockClient::new().with_handler(|request| {
        if is_expansion(request) {
            MockReply::text(GENERATED)
        } else {
            MockReply::text("unused")
        }
    }));

    let response = build(store, llm.clone(), fast_settings())
        .search("hybrid learning")
        .await
        .unwrap();

    assert_eq!(response.outcome, QueryOutcome::NoDataFound);
    assert!(response.results.is_empty());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_top_three_of_five() {
    let store = Arc::new(InMemoryStore::from_documents(vec![
        document("d1", "d1", "one", Some(term_vector(&[("phonics", 1)]))),
        document(
            "d2",
            "d2",
            "two",
            Some(term_vector(&[("phonics", 1), ("reading", 1), ("fluency", 1)])),
        ),
        document("d3", "d3", "three", Some(term_vector(&[("phonics", 1), ("reading", 1)]))),
        document("d4", "d4", "four", Some(term_vector(&[("phonics", 1), ("math", 3)]))),
        document("d5", "d5", "five", Some(term_vector(&[("reading", 1), ("algebra", 1)]))),
    ]));
    let llm = Arc::new(MockClient::new());
    let settings = RagSettings {
        similarity_threshold: 0.1,
        ..fast_settings()
    };

    let response = build(store, llm.clone(), settings)
        .search("phonics reading fluency")
        .await
        .unwrap();

    let ids: Vec<_> = response.results.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["d2", "d3", "d1"]);
    assert!(response
        .results
        .windows(2)
        .all(|pair| pair[0].score > pair[1].score));
    assert!(response.results.iter().all(|r| r.summary.is_some()));
    assert_eq!(llm.calls(), 3);
}

#[tokio::test]
async fn test_one_failed_summary_does_not_affect_others() {
    let store = Arc::new(InMemoryStore::from_documents(vec![
        document(
            "good",
            "Good",
            "Phonics report",
            Some(term_vector(&[("phonics", 2)])),
        ),
        document(
            "bad",
            "Bad",
            "Broken phonics report",
            Some(term_vector(&[("phonics", 1)])),
        ),
    ]));
    let llm = Arc::new(MockClient::new().with_handler(|request| {
        if request.prompt.contains("Broken") {
            MockReply::status(429)
        } else {
            MockReply::text("Useful answer")
        }
    }));

    let response = build(store, llm.clone(), fast_settings())
        .search("phonics")
        .await
        .unwrap();

    assert_eq!(response.results.len(), 2);
    let summary = |id: &str| {
        response
            .results
            .iter()
            .find(|r| r.document.id == id)
            .and_then(|r| r.summary.clone())
    };
    assert_eq!(summary("good").as_deref(), Some("Useful answer"));
    assert_eq!(summary("bad").as_deref(), Some(FAILURE_PLACEHOLDER));

    // One call for the good report, five for the throttled one
    assert_eq!(llm.calls(), 6);
}

#[tokio::test]
async fn test_scan_failure_is_a_search_error() {
    let store = Arc::new(FlakyStore::new(vec![]).failing_scans());
    let llm = Arc::new(MockClient::new());

    let err = build(store, llm.clone(), fast_settings())
        .search("phonics")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Search(_)));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_query_is_trimmed() {
    let store = Arc::new(InMemoryStore::from_documents(vec![document(
        "r1",
        "Phonics",
        "Phonics",
        Some(term_vector(&[("phonics", 1)])),
    )]));

    let response = build(store, Arc::new(MockClient::new()), fast_settings())
        .search("  phonics \n")
        .await
        .unwrap();

    assert_eq!(response.query, "phonics");
    assert_eq!(response.results.len(), 1);
}

/// Answers only once `parties` calls are waiting together, recording the
/// highest number of calls seen in flight.
struct GatedClient {
    gate: tokio::sync::Barrier,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl GatedClient {
    fn new(parties: usize) -> Self {
        Self {
            gate: tokio::sync::Barrier::new(parties),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmClient for GatedClient {
    fn provider_name(&self) -> &str {
        "gated"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.gate.wait().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(LlmResponse::new("Concurrent answer", &request.model))
    }
}

#[tokio::test]
async fn test_summaries_run_concurrently() {
    let store = Arc::new(InMemoryStore::from_documents(
        (1..=4)
            .map(|i| {
                document(
                    &format!("d{}", i),
                    "Phonics",
                    "Phonics report",
                    Some(term_vector(&[("phonics", i)])),
                )
            })
            .collect(),
    ));
    let llm = Arc::new(GatedClient::new(3));
    let orchestrator =
        RetrievalOrchestrator::new(store, llm.clone(), "gemini-test", fast_settings(), None)
            .unwrap();
    orchestrator.mark_ready();

    // Calls made one after another would never pass the gate
    let response = tokio::time::timeout(Duration::from_secs(5), orchestrator.search("phonics"))
        .await
        .expect("summaries did not run concurrently")
        .unwrap();

    assert_eq!(response.results.len(), 3);
    assert!(response
        .results
        .iter()
        .all(|r| r.summary.as_deref() == Some("Concurrent answer")));
    assert_eq!(llm.peak.load(Ordering::SeqCst), 3);
}
