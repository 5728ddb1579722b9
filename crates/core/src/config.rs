//! Configuration management for EduRAG.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config files (.edurag/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with local state stored in `.edurag/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the generation-service factory knows about.
pub const KNOWN_PROVIDERS: [&str; 2] = ["gemini", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .edurag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("gemini" or "mock")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Optional custom endpoint for the generation service
    pub endpoint: Option<String>,

    /// API key for the generation service
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Retrieval tuning
    pub rag: RagSettings,

    /// Document store location
    pub store: StoreSettings,
}

/// Retrieval and synthesis tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RagSettings {
    /// Candidates must score strictly above this to be kept
    pub similarity_threshold: f64,

    /// Number of candidates summarized per query
    pub top_k: usize,

    /// Content longer than this is cut before it is sent for summarization
    pub max_content_chars: usize,

    /// Retry budget for knowledge-base expansion calls
    pub expansion_retry: RetrySettings,

    /// Retry budget for summary calls
    pub summary_retry: RetrySettings,

    /// How the repair job decides whether the store is already migrated
    pub migration_check: MigrationCheck,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.275,
            top_k: 3,
            max_content_chars: 25_000,
            expansion_retry: RetrySettings::new(3, 1000, 1000),
            summary_retry: RetrySettings::new(5, 1000, 1000),
            migration_check: MigrationCheck::FirstDocument,
        }
    }
}

/// Attempt budget and backoff shape for one kind of generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl RetrySettings {
    pub const fn new(max_attempts: u32, base_delay_ms: u64, max_jitter_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_jitter_ms,
        }
    }
}

/// Strategy used by the repair job to detect an already-migrated store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationCheck {
    /// Only the first scanned document is sampled
    #[default]
    FirstDocument,
    /// Every document is inspected
    FullScan,
}

/// Firestore location of the document collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub project_id: Option<String>,
    pub database_id: String,
    pub collection: String,
    /// Name of the environment variable holding a bearer token
    pub access_token_env: Option<String>,
    /// Override for the Firestore REST base URL
    pub endpoint: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: "(default)".to_string(),
            collection: "reports".to_string(),
            access_token_env: None,
            endpoint: None,
        }
    }
}

impl StoreSettings {
    /// Resolve the bearer token from the configured environment variable.
    pub fn access_token(&self) -> Option<String> {
        self.access_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.trim().is_empty())
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    generation: Option<GenerationConfig>,
    rag: Option<RagSettings>,
    store: Option<StoreSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
            endpoint: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            rag: RagSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// Environment variables:
    /// - `EDURAG_WORKSPACE`: Override workspace path
    /// - `EDURAG_CONFIG`: Path to config file
    /// - `EDURAG_PROVIDER`: Generation provider
    /// - `EDURAG_MODEL`: Model identifier
    /// - `EDURAG_API_KEY` / `GEMINI_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use edurag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit paths win over `EDURAG_WORKSPACE` and `EDURAG_CONFIG`; the
    /// YAML is read from whichever location results, so command-line paths
    /// select the file that gets merged.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("EDURAG_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("EDURAG_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".edurag/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("EDURAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("EDURAG_MODEL") {
            config.model = model;
        }

        if let Some(key) = env_non_empty("EDURAG_API_KEY").or_else(|| env_non_empty("GEMINI_API_KEY"))
        {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.clone().merge(config_file))
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(generation) = file.generation {
            if let Some(provider) = generation.provider {
                self.provider = provider;
            }
            if let Some(model) = generation.model {
                self.model = model;
            }
            if generation.endpoint.is_some() {
                self.endpoint = generation.endpoint;
            }
            if let Some(key) = generation.api_key_env.as_deref().and_then(env_non_empty) {
                self.api_key = Some(key);
            }
        }

        if let Some(rag) = file.rag {
            self.rag = rag;
        }

        if let Some(store) = file.store {
            self.store = store;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .edurag directory.
    pub fn edurag_dir(&self) -> PathBuf {
        self.workspace.join(".edurag")
    }

    /// Ensure the .edurag directory exists.
    pub fn ensure_edurag_dir(&self) -> AppResult<()> {
        let dir = self.edurag_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .edurag directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate the provider and retrieval settings.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let threshold = self.rag.similarity_threshold;
        if !(0.0..1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "similarityThreshold must be in [0, 1), got {}",
                threshold
            )));
        }

        if self.rag.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        for (name, retry) in [
            ("expansionRetry", self.rag.expansion_retry),
            ("summaryRetry", self.rag.summary_retry),
        ] {
            if retry.max_attempts == 0 {
                return Err(AppError::Config(format!(
                    "{}.maxAttempts must be at least 1",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
