//! Stats command handler.
//!
//! Shows how many documents the store holds, how many still lack a vector,
//! and which prompts the workspace overrides.

use super::backend::{open_store, StoreArgs};
use anyhow::Result;
use clap::Args;
use edurag_core::config::AppConfig;
use edurag_knowledge::StoreStats;
use edurag_prompt::list_prompts;
use serde_json::{json, Value};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing stats command");
        tracing::debug!("Stats options: {:?}", self);

        let store = open_store(config, &self.store)?;
        let stats = edurag_knowledge::stats(store.as_ref()).await?;
        let overrides = list_prompts(&config.workspace)?;

        if self.json {
            let report = stats_json(store.backend_name(), &stats, &overrides);
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("Backend:          {}", store.backend_name());
            println!("Documents:        {}", stats.documents);
            println!("Missing vectors:  {}", stats.missing_vectors);
            if !overrides.is_empty() {
                println!("Prompt overrides: {}", overrides.join(", "));
            }
            if stats.missing_vectors > 0 {
                println!("\nRun `edurag repair` to backfill the missing vectors.");
            }
        }

        Ok(())
    }
}

fn stats_json(backend: &str, stats: &StoreStats, overrides: &[String]) -> Value {
    json!({
        "backend": backend,
        "documents": stats.documents,
        "missing_vectors": stats.missing_vectors,
        "prompt_overrides": overrides,
    })
}
