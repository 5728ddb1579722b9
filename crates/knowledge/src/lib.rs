//! Retrieval-augmented generation core.
//!
//! Vectorizes queries and documents as sparse term counts, ranks stored
//! documents by cosine similarity, expands the knowledge base through the
//! generation service when nothing matches, and synthesizes a grounded answer
//! per result.
//!
//! # Example
//! ```no_run
//! use edurag_core::RagSettings;
//! use edurag_knowledge::{InMemoryStore, RetrievalOrchestrator};
//! use edurag_llm::MockClient;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = RetrievalOrchestrator::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(MockClient::new()),
//!     "gemini-2.5-flash",
//!     RagSettings::default(),
//!     None,
//! )?;
//! orchestrator.bootstrap().await?;
//!
//! let response = orchestrator.search("phonics reading").await?;
//! for result in &response.results {
//!     println!("{} ({:.3})", result.document.title, result.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod expansion;
pub mod orchestrator;
pub mod repair;
pub mod retry;
pub mod similarity;
pub mod store;
pub mod summary;
pub mod types;
pub mod vectorize;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use expansion::{ExpansionClient, GeneratedDocument};
pub use orchestrator::RetrievalOrchestrator;
pub use repair::repair;
pub use retry::RetryPolicy;
pub use similarity::{cosine_similarity, rank, select_top_k};
pub use store::{DocumentStore, FirestoreStore, InMemoryStore};
pub use summary::{SummarySynthesizer, FAILURE_PLACEHOLDER};
pub use types::{
    Candidate, Document, DocumentPatch, NewDocument, QueryOutcome, QueryResponse, QueryState,
    RepairOutcome, StoreStats, TermVector,
};
pub use vectorize::{tokenize, vectorize};

use edurag_core::AppResult;
use edurag_llm::LlmRequest;
use edurag_prompt::PromptOutputSpec;

/// Carry the prompt's sampling settings onto a request.
pub(crate) fn with_output_settings(mut request: LlmRequest, output: &PromptOutputSpec) -> LlmRequest {
    if let Some(temperature) = output.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = output.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}

/// Count stored documents and those still lacking a vector.
pub async fn stats(store: &dyn DocumentStore) -> AppResult<StoreStats> {
    let documents = store.scan_all().await?;
    let missing_vectors = documents.iter().filter(|d| d.vector.is_none()).count();

    tracing::debug!(
        "{} store holds {} documents, {} without vectors",
        store.backend_name(),
        documents.len(),
        missing_vectors
    );

    Ok(StoreStats {
        documents: documents.len(),
        missing_vectors,
    })
}
