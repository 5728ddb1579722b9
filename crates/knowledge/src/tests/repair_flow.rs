use super::*;
use crate::orchestrator::RetrievalOrchestrator;
use crate::repair::repair;
use crate::vectorize::vectorize;
use edurag_core::MigrationCheck;
use edurag_llm::MockClient;
use std::sync::Arc;

fn legacy_documents() -> Vec<Document> {
    vec![
        document("a", "Phonics", "Systematic phonics instruction", None),
        document("b", "Numeracy", "Early number sense", None),
        document("c", "Attendance", "Chronic absence trends", None),
    ]
}

#[tokio::test]
async fn test_partial_repair_keeps_progress() {
    let store = FlakyStore::new(legacy_documents()).failing_updates_after(1);

    let err = repair(&store, MigrationCheck::FirstDocument).await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    let docs = store.scan_all().await.unwrap();
    assert!(docs[0].vector.is_some());
    assert!(docs[1].vector.is_none());
    assert!(docs[2].vector.is_none());

    // The first document now looks migrated, so a full scan is needed
    store.heal();
    let outcome = repair(&store, MigrationCheck::FullScan).await.unwrap();
    assert_eq!(outcome.repaired, 2);
    assert_eq!(store.inner.writes(), 3);

    let docs = store.scan_all().await.unwrap();
    for doc in &docs {
        assert_eq!(doc.vector, Some(vectorize(&doc.vector_text())));
    }
}

#[tokio::test]
async fn test_failed_bootstrap_leaves_orchestrator_not_ready() {
    let store = Arc::new(FlakyStore::new(legacy_documents()).failing_updates_after(0));
    let orchestrator = RetrievalOrchestrator::new(
        store.clone(),
        Arc::new(MockClient::new()),
        "gemini-test",
        fast_settings(),
        None,
    )
    .unwrap();

    assert!(orchestrator.bootstrap().await.is_err());
    assert!(!orchestrator.is_ready());
    assert!(matches!(
        orchestrator.search("phonics").await,
        Err(AppError::NotReady(_))
    ));

    store.heal();
    let outcome = orchestrator.bootstrap().await.unwrap();
    assert_eq!(outcome.repaired, 3);
    assert!(orchestrator.is_ready());
}

#[tokio::test]
async fn test_repaired_documents_become_searchable() {
    let store = Arc::new(FlakyStore::new(legacy_documents()));
    let orchestrator = RetrievalOrchestrator::new(
        store,
        Arc::new(MockClient::new()),
        "gemini-test",
        fast_settings(),
        None,
    )
    .unwrap();

    orchestrator.bootstrap().await.unwrap();
    let response = orchestrator.search("phonics instruction").await.unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].document.id, "a");
    assert!(!response.expanded());
}
