//! Repair command handler.
//!
//! Backfills vectors on documents that do not have one yet.

use super::backend::{open_store, StoreArgs};
use anyhow::Result;
use clap::Args;
use edurag_core::{config::AppConfig, MigrationCheck};
use edurag_knowledge::repair;

/// Attach vectors to stored documents that lack them
#[derive(Args, Debug)]
pub struct RepairCommand {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Inspect every document instead of sampling the first one
    #[arg(long)]
    pub full_scan: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RepairCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing repair command");
        tracing::debug!("Repair options: {:?}", self);

        let store = open_store(config, &self.store)?;
        let check = if self.full_scan {
            MigrationCheck::FullScan
        } else {
            config.rag.migration_check
        };

        let outcome = repair(store.as_ref(), check).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else if outcome.already_migrated {
            println!(
                "Knowledge base already migrated ({} documents scanned).",
                outcome.scanned
            );
        } else {
            println!(
                "Repaired {} of {} documents.",
                outcome.repaired, outcome.scanned
            );
        }

        Ok(())
    }
}
