//! Document store abstraction.
//!
//! The [`DocumentStore`] trait covers the three operations the retrieval
//! pipeline needs from the shared collection: a full scan, an insert that
//! assigns an id, and a partial update of the vector field.
//!
//! Implementations must be `Send + Sync` to be shared across tasks.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::InMemoryStore;

use crate::types::{Document, DocumentPatch, NewDocument};
use async_trait::async_trait;
use edurag_core::AppResult;

/// Abstract document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Backend name for logs (e.g., "memory", "firestore").
    fn backend_name(&self) -> &str;

    /// Every document in the collection, in the backend's scan order.
    async fn scan_all(&self) -> AppResult<Vec<Document>>;

    /// Persist a new document and return its assigned id.
    async fn insert(&self, document: &NewDocument) -> AppResult<String>;

    /// Apply a partial update to an existing document.
    ///
    /// Only the fields in the patch are touched.
    async fn update_fields(&self, id: &str, patch: &DocumentPatch) -> AppResult<()>;
}
