//! Ask command handler.
//!
//! Bootstraps the knowledge base, runs one query and prints the ranked,
//! summarized results.

use super::backend::{open_store, orchestrator, StoreArgs};
use anyhow::Result;
use clap::Args;
use edurag_core::{config::AppConfig, AppError};
use edurag_knowledge::{QueryOutcome, QueryResponse};

/// Ask a research question against the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The research question
    pub query: String,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Minimum similarity a document must exceed to be considered
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Number of results to summarize
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let config = self.apply_overrides(config)?;
        let store = open_store(&config, &self.store)?;
        let orchestrator = orchestrator(&config, store)?;

        let repaired = orchestrator.bootstrap().await?;
        if repaired.repaired > 0 {
            tracing::info!("Backfilled {} document vectors", repaired.repaired);
        }

        let response = match orchestrator.search(&self.query).await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("{}: {}", notice_title(&e), e);
                return Err(e.into());
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", render_markdown(&response));
        }

        Ok(())
    }

    fn apply_overrides(&self, config: &AppConfig) -> Result<AppConfig> {
        let mut config = config.clone();
        if let Some(threshold) = self.threshold {
            config.rag.similarity_threshold = threshold;
        }
        if let Some(top_k) = self.top_k {
            config.rag.top_k = top_k;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Short heading shown above a rejected or failed query.
fn notice_title(error: &AppError) -> &'static str {
    match error {
        AppError::NotReady(_) => "System Not Ready",
        AppError::EmptyQuery => "Empty Query",
        AppError::ExpansionInFlight => "Expansion In Progress",
        AppError::Search(_) => "Search Error",
        _ => "Error",
    }
}

/// Render results as Markdown.
fn render_markdown(response: &QueryResponse) -> String {
    if response.outcome == QueryOutcome::NoDataFound {
        return format!(
            "No Data Found: no report matched \"{}\" and none could be located online.\n",
            response.query
        );
    }

    let mut out = format!("# Results for \"{}\"\n", response.query);
    if response.expanded() {
        out.push_str("\n_The knowledge base was expanded to answer this question._\n");
    }

    for (rank, result) in response.results.iter().enumerate() {
        let document = &result.document;
        out.push_str(&format!(
            "\n## {}. {} (score {:.3})\n",
            rank + 1,
            document.title,
            result.score
        ));

        let source: Vec<&str> = [document.publisher.as_deref(), document.url.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if !source.is_empty() {
            out.push_str(&format!("_{}_\n", source.join(" | ")));
        }

        if let Some(summary) = &result.summary {
            out.push_str(&format!("\n{}\n", summary));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use edurag_knowledge::{Candidate, Document, QueryState};

    fn response(outcome: QueryOutcome, results: Vec<Candidate>) -> QueryResponse {
        QueryResponse {
            query: "phonics reading".to_string(),
            results,
            outcome,
            path: vec![QueryState::Idle, QueryState::Done],
        }
    }

    #[test]
    fn test_render_no_data_found() {
        let text = render_markdown(&response(QueryOutcome::NoDataFound, vec![]));
        assert!(text.starts_with("No Data Found"));
        assert!(text.contains("\"phonics reading\""));
    }

    #[test]
    fn test_render_results() {
        let document = Document {
            id: "r1".to_string(),
            title: "Phonics review".to_string(),
            content: "body".to_string(),
            keywords: vec![],
            category: None,
            publisher: Some("Institute".to_string()),
            url: Some("https://example.org/r1".to_string()),
            vector: None,
        };
        let mut candidate = Candidate::new(document, 0.9449);
        candidate.summary = Some("Phonics helps.".to_string());

        let text = render_markdown(&response(QueryOutcome::Found, vec![candidate]));
        assert!(text.contains("## 1. Phonics review (score 0.945)"));
        assert!(text.contains("_Institute | https://example.org/r1_"));
        assert!(text.contains("Phonics helps."));
        assert!(!text.contains("expanded"));
    }

    #[test]
    fn test_notice_titles() {
        assert_eq!(notice_title(&AppError::EmptyQuery), "Empty Query");
        assert_eq!(
            notice_title(&AppError::NotReady("x".to_string())),
            "System Not Ready"
        );
        assert_eq!(notice_title(&AppError::Search("x".to_string())), "Search Error");
    }
}
