//! Generation provider factory.
//!
//! Builds the client selected in configuration. A missing API key is not an
//! error here: the client is still created and reports
//! `has_credentials() == false`, so the orchestrator can reject queries as
//! not-ready instead of the whole process refusing to start.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, MockClient};
use edurag_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generation client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "mock")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - Optional API key
///
/// # Errors
/// Returns `AppError::Config` for unknown providers and `AppError::Llm` if the
/// HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let key = api_key.unwrap_or_default();
            let client = match endpoint {
                Some(base_url) => GeminiClient::with_base_url(base_url, key)?,
                None => GeminiClient::new(key)?,
            };
            if !client.has_credentials() {
                tracing::warn!("No API key configured for the Gemini provider");
            }
            Ok(Arc::new(client))
        }
        "mock" => Ok(Arc::new(MockClient::new())),
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}
