//! Cross-module tests for the query and repair flows.

mod query_flow;
mod repair_flow;

use crate::store::{DocumentStore, InMemoryStore};
use crate::types::{Document, DocumentPatch, NewDocument, TermVector};
use async_trait::async_trait;
use edurag_core::{AppError, AppResult, RagSettings, RetrySettings};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Settings with millisecond retry delays.
fn fast_settings() -> RagSettings {
    RagSettings {
        expansion_retry: RetrySettings::new(3, 1, 0),
        summary_retry: RetrySettings::new(5, 1, 0),
        ..RagSettings::default()
    }
}

fn term_vector(pairs: &[(&str, u32)]) -> TermVector {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn document(id: &str, title: &str, content: &str, vector: Option<TermVector>) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        keywords: vec![],
        category: None,
        publisher: None,
        url: None,
        vector,
    }
}

/// Wraps an [`InMemoryStore`] and injects failures.
struct FlakyStore {
    inner: InMemoryStore,
    fail_scan: AtomicBool,
    fail_inserts: AtomicBool,
    /// Updates succeed this many times, then fail
    updates_before_failure: AtomicUsize,
}

impl FlakyStore {
    fn new(documents: Vec<Document>) -> Self {
        Self {
            inner: InMemoryStore::from_documents(documents),
            fail_scan: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            updates_before_failure: AtomicUsize::new(usize::MAX),
        }
    }

    fn failing_inserts(self) -> Self {
        self.fail_inserts.store(true, Ordering::SeqCst);
        self
    }

    fn failing_scans(self) -> Self {
        self.fail_scan.store(true, Ordering::SeqCst);
        self
    }

    fn failing_updates_after(self, successes: usize) -> Self {
        self.updates_before_failure.store(successes, Ordering::SeqCst);
        self
    }

    fn heal(&self) {
        self.fail_scan.store(false, Ordering::SeqCst);
        self.fail_inserts.store(false, Ordering::SeqCst);
        self.updates_before_failure.store(usize::MAX, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    fn backend_name(&self) -> &str {
        "flaky"
    }

    async fn scan_all(&self) -> AppResult<Vec<Document>> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(AppError::Store("scan unavailable".to_string()));
        }
        self.inner.scan_all().await
    }

    async fn insert(&self, document: &NewDocument) -> AppResult<String> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Store("permission denied".to_string()));
        }
        self.inner.insert(document).await
    }

    async fn update_fields(&self, id: &str, patch: &DocumentPatch) -> AppResult<()> {
        let remaining = self.updates_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(AppError::Store(format!("write rejected for {}", id)));
        }
        if remaining != usize::MAX {
            self.updates_before_failure.store(remaining - 1, Ordering::SeqCst);
        }
        self.inner.update_fields(id, patch).await
    }
}
