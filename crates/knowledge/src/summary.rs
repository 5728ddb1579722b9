//! Query-grounded summaries of candidate documents.

use crate::retry::RetryPolicy;
use edurag_core::AppResult;
use edurag_llm::{LlmClient, LlmRequest};
use edurag_prompt::{build_prompt, PromptDefinition};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Returned when every attempt failed.
pub const FAILURE_PLACEHOLDER: &str = "Failed to generate AI-grounded answer.";

/// Returned when the service answered with no text.
pub const EMPTY_ANSWER: &str = "Could not generate a relevant summary based on the report data.";

/// Appended to content cut at the length limit.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Cut `content` to at most `max_chars` characters, marking the cut.
pub fn truncate_content(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_index, _)) => Cow::Owned(format!("{}{}", &content[..byte_index], TRUNCATION_MARKER)),
        None => Cow::Borrowed(content),
    }
}

/// Produces one grounded answer per candidate document.
pub struct SummarySynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
    retry: RetryPolicy,
    max_content_chars: usize,
}

impl SummarySynthesizer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
        retry: RetryPolicy,
        max_content_chars: usize,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            prompt,
            retry,
            max_content_chars,
        }
    }

    /// Answer `query` from `content` alone.
    ///
    /// Only 429 and 503 are retried, waiting for the server hint when one is
    /// given. Never fails: exhaustion or a permanent error yields
    /// [`FAILURE_PLACEHOLDER`].
    pub async fn summarize(&self, content: &str, query: &str) -> String {
        let request = match self.request(content, query) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!("Could not build summary prompt: {}", e);
                return FAILURE_PLACEHOLDER.to_string();
            }
        };

        let mut attempt = 1;
        loop {
            match self.llm.complete(&request).await {
                Ok(response) => {
                    let answer = response.content.trim();
                    if answer.is_empty() {
                        return EMPTY_ANSWER.to_string();
                    }
                    return answer.to_string();
                }
                Err(e) if e.is_transient() && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt, e.retry_after());
                    tracing::warn!(
                        "Summary call throttled (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.retry.max_attempts,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Summary failed after {} attempts: {}", attempt, e);
                    return FAILURE_PLACEHOLDER.to_string();
                }
            }
        }
    }

    fn request(&self, content: &str, query: &str) -> AppResult<LlmRequest> {
        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert(
            "content".to_string(),
            truncate_content(content, self.max_content_chars).into_owned(),
        );

        let built = build_prompt(&self.prompt, variables)?;
        let mut request = crate::with_output_settings(
            LlmRequest::new(built.user, self.model.clone()),
            &self.prompt.output,
        );
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        Ok(request)
    }
}
