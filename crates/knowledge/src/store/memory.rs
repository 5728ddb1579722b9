//! In-memory [`DocumentStore`] for tests, seeds and offline runs.
//!
//! Documents live in a `Vec` behind `std::sync::RwLock`, so scan order is
//! insertion order.

use super::DocumentStore;
use crate::types::{Document, DocumentPatch, NewDocument};
use async_trait::async_trait;
use edurag_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory store.
pub struct InMemoryStore {
    documents: RwLock<Vec<Document>>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::from_documents(Vec::new())
    }

    /// Seed the store. Documents without an id get a fresh one.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|mut document| {
                if document.id.is_empty() {
                    document.id = uuid::Uuid::new_v4().to_string();
                }
                document
            })
            .collect();

        Self {
            documents: RwLock::new(documents),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of inserts and updates applied since creation.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Document>> {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Document>> {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn scan_all(&self) -> AppResult<Vec<Document>> {
        Ok(self.read().clone())
    }

    async fn insert(&self, document: &NewDocument) -> AppResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write().push(document.clone().into_document(id.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update_fields(&self, id: &str, patch: &DocumentPatch) -> AppResult<()> {
        let mut documents = self.write();
        let document = documents
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or_else(|| AppError::Store(format!("Document not found: {}", id)))?;

        document.vector = Some(patch.vector.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TermVector;
    use crate::vectorize::vectorize;

    fn doc(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            content: "content".to_string(),
            keywords: vec![],
            category: None,
            publisher: None,
            url: None,
            vector: None,
        }
    }

    #[tokio::test]
    async fn test_seed_assigns_missing_ids() {
        let store = InMemoryStore::from_documents(vec![doc("", "A"), doc("fixed", "B")]);
        let docs = store.scan_all().await.unwrap();

        assert_eq!(docs.len(), 2);
        assert!(!docs[0].id.is_empty());
        assert_eq!(docs[1].id, "fixed");
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_insert_then_scan() {
        let store = InMemoryStore::new();
        let new_doc = NewDocument {
            title: "Hybrid learning".to_string(),
            content: "Blended classrooms".to_string(),
            keywords: vec!["hybrid".to_string()],
            category: Some("Technology".to_string()),
            publisher: None,
            url: None,
            vector: vectorize("hybrid learning"),
        };

        let id = store.insert(&new_doc).await.unwrap();
        let docs = store.scan_all().await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].title, "Hybrid learning");
        assert!(docs[0].vector.is_some());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_update_only_touches_vector() {
        let store = InMemoryStore::from_documents(vec![doc("a", "Phonics")]);
        let mut vector = TermVector::new();
        vector.insert("phonics".to_string(), 1);

        store
            .update_fields("a", &DocumentPatch { vector: vector.clone() })
            .await
            .unwrap();

        let docs = store.scan_all().await.unwrap();
        assert_eq!(docs[0].title, "Phonics");
        assert_eq!(docs[0].vector, Some(vector));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryStore::new();
        let err = store
            .update_fields("missing", &DocumentPatch { vector: TermVector::new() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }
}
