//! Knowledge-base expansion through the generation service.
//!
//! When nothing in the store passes the threshold, the service is asked to
//! locate and summarize one authoritative document for the query. The reply
//! is a strictly typed JSON object.

use crate::retry::RetryPolicy;
use crate::types::NewDocument;
use crate::vectorize::{document_text, vectorize};
use edurag_core::{AppError, AppResult};
use edurag_llm::{LlmClient, LlmRequest};
use edurag_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A document synthesized by the generation service, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl GeneratedDocument {
    /// Compute the vector and produce an insertable document.
    pub fn into_new_document(self) -> NewDocument {
        let vector = vectorize(&document_text(
            &self.title,
            &self.content,
            self.category.as_deref(),
            &self.keywords,
        ));

        NewDocument {
            title: self.title,
            content: self.content,
            keywords: self.keywords,
            category: self.category,
            publisher: self.publisher,
            url: self.url,
            vector,
        }
    }
}

/// Response schema in the generation service's OpenAPI subset.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "content": { "type": "STRING" },
            "keywords": { "type": "ARRAY", "items": { "type": "STRING" } },
            "category": { "type": "STRING" },
            "publisher": { "type": "STRING" },
            "url": { "type": "STRING" }
        },
        "required": ["title", "content", "keywords", "category", "publisher", "url"],
        "propertyOrdering": ["title", "content", "keywords", "category", "publisher", "url"]
    })
}

/// Client that asks the generation service for one new document.
pub struct ExpansionClient {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    retry: RetryPolicy,
}

impl ExpansionClient {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
            retry,
        }
    }

    /// Ask for a document answering `query`.
    ///
    /// Any non-success reply is retried until the attempt budget is spent. A
    /// reply that does not parse is not retried. Every failure yields `None`.
    pub async fn expand(&self, query: &str) -> Option<GeneratedDocument> {
        let request = match self.request(query) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Could not build expansion prompt: {}", e);
                return None;
            }
        };

        let mut attempt = 1;
        let text = loop {
            match self.llm.complete(&request).await {
                Ok(response) => break response.content,
                Err(e) if self.retry.allows_retry(attempt) => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        "Expansion failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.retry.max_attempts,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Expansion abandoned after {} attempts: {}",
                        attempt,
                        e
                    );
                    return None;
                }
            }
        };

        match parse_document(&text) {
            Ok(document) => {
                tracing::info!("Generated document '{}' for query", document.title);
                Some(document)
            }
            Err(e) => {
                tracing::warn!("Discarding malformed expansion reply: {}", e);
                None
            }
        }
    }

    fn request(&self, query: &str) -> AppResult<LlmRequest> {
        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert(
            "today".to_string(),
            chrono::Utc::now().format("%Y-%m-%d").to_string(),
        );

        let built = build_prompt(&self.prompt, variables)?;
        let mut request = crate::with_output_settings(
            LlmRequest::new(built.user, self.model.clone()).with_json_schema(response_schema()),
            &self.prompt.output,
        );
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}

/// Parse the reply, tolerating a Markdown code fence around the object.
fn parse_document(text: &str) -> AppResult<GeneratedDocument> {
    let body = strip_code_fence(text.trim());
    let document: GeneratedDocument = serde_json::from_str(body)
        .map_err(|e| AppError::Llm(format!("Expansion reply is not the expected JSON: {}", e)))?;

    if document.title.trim().is_empty() || document.content.trim().is_empty() {
        return Err(AppError::Llm(
            "Expansion reply has an empty title or content".to_string(),
        ));
    }
    Ok(document)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
