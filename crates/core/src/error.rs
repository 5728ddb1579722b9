//! Error types for EduRAG.
//!
//! This module defines a unified error enum covering every failure category in
//! the retrieval pipeline: readiness and validation rejections, generation
//! service failures (transient vs. permanent), document-store failures, and
//! unexpected failures caught at the orchestrator boundary.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for EduRAG.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The knowledge base or generation service is not usable yet
    #[error("System not ready: {0}")]
    NotReady(String),

    /// The query text was empty or whitespace-only
    #[error("Empty query: please enter a topic to search")]
    EmptyQuery,

    /// Another query is currently expanding the knowledge base
    #[error("Knowledge base expansion already in progress")]
    ExpansionInFlight,

    /// Generation service answered with a non-success status
    #[error("LLM API error ({status}): {message}")]
    LlmStatus {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Generation service transport or response-shape errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document store read/write errors
    #[error("Store error: {0}")]
    Store(String),

    /// Unexpected failure while executing a search
    #[error("Search failed: {0}")]
    Search(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error is a rate-limit (429) or service-unavailable (503) answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::LlmStatus { status: 429 | 503, .. })
    }

    /// Server-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::LlmStatus { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
