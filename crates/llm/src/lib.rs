//! Generation-service integration crate for EduRAG.
//!
//! This crate provides a provider-agnostic abstraction over the external
//! text generation service used to summarize documents and to synthesize
//! new ones.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Mock**: scripted replies for tests and offline runs
//!
//! # Example
//! ```no_run
//! use edurag_llm::{LlmClient, LlmRequest, providers::GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("api-key")?;
//! let request = LlmRequest::new("Summarize phonics research", "gemini-2.5-flash");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, MockClient, MockReply};
