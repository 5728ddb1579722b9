//! Prompt system for EduRAG.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in definitions for summary synthesis and knowledge-base expansion
//! - Workspace overrides in `.edurag/prompts/<id>.yml`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{builtin_prompt, EXPANSION_PROMPT_ID, SUMMARY_PROMPT_ID};
pub use loader::{list_prompts, load_prompt, load_prompt_or_default};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
