//! Command handlers for the EduRAG CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod backend;
pub mod repair;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use repair::RepairCommand;
pub use stats::StatsCommand;
