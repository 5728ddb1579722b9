//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse term-frequency vector: token -> occurrence count.
pub type TermVector = HashMap<String, u32>;

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: String,

    pub title: String,

    /// Grounding text for summaries
    pub content: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Derived from the text fields; absent only until the repair job runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<TermVector>,
}

impl Document {
    /// Text the vector is computed from.
    pub fn vector_text(&self) -> String {
        crate::vectorize::document_text(
            &self.title,
            &self.content,
            self.category.as_deref(),
            &self.keywords,
        )
    }
}

/// A document about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub url: Option<String>,
    pub vector: TermVector,
}

impl NewDocument {
    /// Attach the store-assigned id.
    pub fn into_document(self, id: impl Into<String>) -> Document {
        Document {
            id: id.into(),
            title: self.title,
            content: self.content,
            keywords: self.keywords,
            category: self.category,
            publisher: self.publisher,
            url: self.url,
            vector: Some(self.vector),
        }
    }
}

/// Partial update. Only the vector can be added after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub vector: TermVector,
}

/// A document scored against the current query.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub document: Document,

    /// Cosine similarity to the query vector, in [0, 1]
    pub score: f64,

    /// Grounded answer, filled in by the summary stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Candidate {
    pub fn new(document: Document, score: f64) -> Self {
        Self {
            document,
            score,
            summary: None,
        }
    }
}

/// Per-query lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    Idle,
    Vectorizing,
    Scanning,
    Expanding,
    Ranking,
    Synthesizing,
    Done,
    Failed,
}

/// How a completed query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// At least one summarized result
    Found,
    /// Nothing passed the threshold and expansion produced nothing usable
    NoDataFound,
}

/// Result of one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query: String,

    /// Ranked best-first, each with a summary
    pub results: Vec<Candidate>,

    pub outcome: QueryOutcome,

    /// States visited, in order
    pub path: Vec<QueryState>,
}

impl QueryResponse {
    /// Whether the knowledge base was expanded for this query.
    pub fn expanded(&self) -> bool {
        self.path.contains(&QueryState::Expanding)
    }
}

/// Outcome of one repair pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    /// Documents returned by the scan
    pub scanned: usize,

    /// Documents that received a vector in this pass
    pub repaired: usize,

    /// The migration check decided no work was needed
    pub already_migrated: bool,
}

/// Document counts for a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: usize,

    /// Documents the repair job has not reached yet
    pub missing_vectors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserialization_defaults() {
        let json = r#"{"title": "Phonics", "content": "Reading programs"}"#;
        let doc: Document = serde_json::from_str(json).unwrap();

        assert!(doc.id.is_empty());
        assert!(doc.keywords.is_empty());
        assert!(doc.category.is_none());
        assert!(doc.vector.is_none());
    }

    #[test]
    fn test_new_document_into_document() {
        let mut vector = TermVector::new();
        vector.insert("phonics".to_string(), 2);

        let doc = NewDocument {
            title: "Phonics".to_string(),
            content: "phonics".to_string(),
            keywords: vec![],
            category: None,
            publisher: Some("Institute".to_string()),
            url: None,
            vector: vector.clone(),
        }
        .into_document("abc");

        assert_eq!(doc.id, "abc");
        assert_eq!(doc.vector, Some(vector));
        assert_eq!(doc.publisher.as_deref(), Some("Institute"));
    }

    #[test]
    fn test_query_response_expanded() {
        let response = QueryResponse {
            query: "q".to_string(),
            results: vec![],
            outcome: QueryOutcome::NoDataFound,
            path: vec![QueryState::Idle, QueryState::Expanding, QueryState::Done],
        };
        assert!(response.expanded());
        assert_eq!(
            serde_json::to_value(response.outcome).unwrap(),
            serde_json::json!("no_data_found")
        );
    }
}
