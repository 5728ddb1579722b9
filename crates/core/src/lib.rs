//! EduRAG Core Library
//!
//! This crate provides the foundational utilities shared by every EduRAG crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig`, `RagSettings`, `StoreSettings`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, MigrationCheck, RagSettings, RetrySettings, StoreSettings};
pub use error::{AppError, AppResult};
