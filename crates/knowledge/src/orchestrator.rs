//! Per-query retrieval flow.
//!
//! `Idle -> Vectorizing -> Scanning -> (Expanding) -> Ranking -> Synthesizing -> Done`
//!
//! Rejections (not ready, expansion in flight, missing credential, empty
//! query) happen before any state change. Anything unexpected after that is
//! reported as [`AppError::Search`] and partial results are discarded.

use crate::expansion::ExpansionClient;
use crate::repair::repair;
use crate::retry::RetryPolicy;
use crate::similarity::{cosine_similarity, rank, select_top_k};
use crate::store::DocumentStore;
use crate::summary::SummarySynthesizer;
use crate::types::{Candidate, QueryOutcome, QueryResponse, QueryState, RepairOutcome, TermVector};
use crate::vectorize::vectorize;
use edurag_core::{AppError, AppResult, RagSettings};
use edurag_llm::LlmClient;
use edurag_prompt::{load_prompt_or_default, EXPANSION_PROMPT_ID, SUMMARY_PROMPT_ID};
use futures::future::join_all;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds the expansion slot until dropped.
struct ExpansionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ExpansionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ExpansionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Composes the vectorizer, ranker, expansion client and summary synthesizer.
pub struct RetrievalOrchestrator {
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmClient>,
    expansion: ExpansionClient,
    synthesizer: SummarySynthesizer,
    settings: RagSettings,
    ready: AtomicBool,
    expanding: AtomicBool,
}

impl RetrievalOrchestrator {
    /// Create an orchestrator. Prompts are taken from the workspace when
    /// overridden there, otherwise the built-in definitions are used.
    ///
    /// The knowledge base starts out not ready; call [`bootstrap`](Self::bootstrap).
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmClient>,
        model: &str,
        settings: RagSettings,
        workspace: Option<&Path>,
    ) -> AppResult<Self> {
        let expansion = ExpansionClient::new(
            llm.clone(),
            model,
            load_prompt_or_default(workspace, EXPANSION_PROMPT_ID)?,
            RetryPolicy::from(settings.expansion_retry),
        );
        let synthesizer = SummarySynthesizer::new(
            llm.clone(),
            model,
            load_prompt_or_default(workspace, SUMMARY_PROMPT_ID)?,
            RetryPolicy::from(settings.summary_retry),
            settings.max_content_chars,
        );

        Ok(Self {
            store,
            llm,
            expansion,
            synthesizer,
            settings,
            ready: AtomicBool::new(false),
            expanding: AtomicBool::new(false),
        })
    }

    /// Run the repair job and mark the knowledge base ready if it succeeds.
    ///
    /// On failure the orchestrator stays not ready and `bootstrap` may be
    /// called again.
    pub async fn bootstrap(&self) -> AppResult<RepairOutcome> {
        let outcome = repair(self.store.as_ref(), self.settings.migration_check).await?;
        self.mark_ready();
        Ok(outcome)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Mark the knowledge base ready without running the repair job.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether a query currently holds the expansion slot.
    pub fn is_expanding(&self) -> bool {
        self.expanding.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Answer one query.
    pub async fn search(&self, query: &str) -> AppResult<QueryResponse> {
        self.admit(query)?;

        let query = query.trim();
        let mut path = vec![QueryState::Idle];

        match self.run(query, &mut path).await {
            Ok(response) => Ok(response),
            Err(e) => {
                enter(&mut path, QueryState::Failed);
                tracing::error!("Search for '{}' failed: {}", query, e);
                Err(match e {
                    AppError::ExpansionInFlight | AppError::Search(_) => e,
                    other => AppError::Search(other.to_string()),
                })
            }
        }
    }

    fn admit(&self, query: &str) -> AppResult<()> {
        if !self.is_ready() {
            return Err(AppError::NotReady(
                "the knowledge base is still being prepared".to_string(),
            ));
        }
        if self.is_expanding() {
            return Err(AppError::ExpansionInFlight);
        }
        if !self.llm.has_credentials() {
            return Err(AppError::NotReady(format!(
                "no credential configured for the {} generation service",
                self.llm.provider_name()
            )));
        }
        if query.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        Ok(())
    }

    async fn run(&self, query: &str, path: &mut Vec<QueryState>) -> AppResult<QueryResponse> {
        enter(path, QueryState::Vectorizing);
        let query_vector = vectorize(query);

        enter(path, QueryState::Scanning);
        let documents = self.store.scan_all().await?;
        let scanned = documents.len();
        let mut candidates = rank(documents, &query_vector, self.settings.similarity_threshold);
        tracing::debug!(
            "{} of {} documents scored above {}",
            candidates.len(),
            scanned,
            self.settings.similarity_threshold
        );

        if candidates.is_empty() {
            enter(path, QueryState::Expanding);
            let _guard = ExpansionGuard::acquire(&self.expanding).ok_or(AppError::ExpansionInFlight)?;
            candidates.extend(self.expand(query, &query_vector).await);

            if candidates.is_empty() {
                enter(path, QueryState::Done);
                tracing::info!("No data found for '{}'", query);
                return Ok(QueryResponse {
                    query: query.to_string(),
                    results: Vec::new(),
                    outcome: QueryOutcome::NoDataFound,
                    path: std::mem::take(path),
                });
            }
        }

        enter(path, QueryState::Ranking);
        let mut results = select_top_k(candidates, self.settings.top_k);

        enter(path, QueryState::Synthesizing);
        let summaries = join_all(
            results
                .iter()
                .map(|candidate| self.synthesizer.summarize(&candidate.document.content, query)),
        )
        .await;
        for (candidate, summary) in results.iter_mut().zip(summaries) {
            candidate.summary = Some(summary);
        }

        enter(path, QueryState::Done);
        tracing::info!("Returning {} results for '{}'", results.len(), query);

        Ok(QueryResponse {
            query: query.to_string(),
            results,
            outcome: QueryOutcome::Found,
            path: std::mem::take(path),
        })
    }

    /// Generate, vectorize and persist one new document.
    ///
    /// The document is only returned as a candidate if the insert succeeded.
    async fn expand(&self, query: &str, query_vector: &TermVector) -> Option<Candidate> {
        let generated = self.expansion.expand(query).await?;
        let new_document = generated.into_new_document();

        match self.store.insert(&new_document).await {
            Ok(id) => {
                tracing::info!("Persisted expanded document {} ('{}')", id, new_document.title);
                let document = new_document.into_document(id);
                let score = document
                    .vector
                    .as_ref()
                    .map(|vector| cosine_similarity(query_vector, vector))
                    .unwrap_or(0.0);
                Some(Candidate::new(document, score))
            }
            Err(e) => {
                tracing::warn!(
                    "Dropping generated document '{}' because it could not be stored: {}",
                    new_document.title,
                    e
                );
                None
            }
        }
    }
}

fn enter(path: &mut Vec<QueryState>, state: QueryState) {
    if let Some(previous) = path.last() {
        tracing::debug!("Query state {:?} -> {:?}", previous, state);
    }
    path.push(state);
}
