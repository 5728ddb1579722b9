//! Store and orchestrator wiring shared by the commands.

use anyhow::{bail, Context, Result};
use clap::Args;
use edurag_core::config::AppConfig;
use edurag_knowledge::{
    Document, DocumentStore, FirestoreStore, InMemoryStore, RetrievalOrchestrator,
};
use edurag_llm::create_client;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where documents come from
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Load documents from a JSON array into an in-memory store instead of Firestore
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,
}

/// Open the document store selected by flags and configuration.
pub fn open_store(config: &AppConfig, args: &StoreArgs) -> Result<Arc<dyn DocumentStore>> {
    if let Some(seed) = &args.seed {
        let documents = load_seed(seed)?;
        tracing::info!("Loaded {} seed documents from {:?}", documents.len(), seed);
        return Ok(Arc::new(InMemoryStore::from_documents(documents)));
    }

    if config.store.project_id.is_none() {
        bail!(
            "No document store configured: pass --seed <FILE> or set store.projectId in {:?}",
            config.edurag_dir().join("config.yaml")
        );
    }

    let store = FirestoreStore::from_settings(&config.store)?;
    tracing::info!(
        "Using Firestore collection '{}' in database '{}'",
        config.store.collection,
        config.store.database_id
    );
    Ok(Arc::new(store))
}

/// Read a seed file: a JSON array of documents.
pub fn load_seed(path: &Path) -> Result<Vec<Document>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {:?}", path))?;
    let documents: Vec<Document> = serde_json::from_str(&contents)
        .with_context(|| format!("Seed file {:?} is not a JSON array of documents", path))?;
    Ok(documents)
}

/// Build an orchestrator over `store` using the configured generation provider.
pub fn orchestrator(
    config: &AppConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<RetrievalOrchestrator> {
    let llm = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    let orchestrator = RetrievalOrchestrator::new(
        store,
        llm,
        &config.model,
        config.rag.clone(),
        Some(config.workspace.as_path()),
    )?;
    Ok(orchestrator)
}
