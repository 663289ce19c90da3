//! Pipeline configuration
//!
//! Loaded once at process start from an optional YAML file, then
//! overridden from environment variables of the same upper-case names.
//! Every key has a default so an empty file (or no file) is valid.

use crate::error::ConfigError;
use renamer_core::RenameSettings;
use renamer_llm::{GeneratorBackend, GeneratorSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Worker count sentinel meaning one worker per hardware thread
pub const ALL_CORES: i64 = -1;

/// Sample cap sentinel meaning no cap
pub const UNLIMITED: i64 = -1;

/// Read-only settings shared by every worker
///
/// `Debug` output never shows the API key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct PipelineConfig {
    /// Generator calls allowed per method
    pub tries: usize,
    /// Worker pool size, `-1` for all cores
    pub amt_workers: i64,
    /// Oracle files scored in eval mode, `-1` for all
    pub amount_of_eval_samples: i64,
    /// Stem of the benchmark results file
    pub metrics_name: String,
    /// Model passed to the generator
    pub llm_model: String,
    /// Generator base URL
    pub llm_base_url: String,
    /// Generator key
    pub llm_api_key: Option<String>,
    /// Generator protocol
    pub llm_backend: GeneratorBackend,
    /// Per-call timeout for generator and scorer
    pub request_timeout_secs: u64,
    /// Readability scorer base URL; scoring is skipped when unset
    pub readability_url: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            amt_workers: ALL_CORES,
            amount_of_eval_samples: UNLIMITED,
            metrics_name: "rename_pipeline".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            llm_backend: GeneratorBackend::OpenAi,
            request_timeout_secs: 30,
            readability_url: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("tries", &self.tries)
            .field("amt_workers", &self.amt_workers)
            .field("amount_of_eval_samples", &self.amount_of_eval_samples)
            .field("metrics_name", &self.metrics_name)
            .field("llm_model", &self.llm_model)
            .field("llm_base_url", &self.llm_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "<redacted-secret>"),
            )
            .field("llm_backend", &self.llm_backend)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("readability_url", &self.readability_url)
            .finish()
    }
}

impl PipelineConfig {
    /// Load from `path` (or defaults), apply process environment, validate
    ///
    /// # Errors
    /// - `ConfigError` if the file is unreadable or any value is invalid
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse a YAML config file
    ///
    /// # Errors
    /// - `ConfigError::Io` or `ConfigError::Yaml`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse YAML text; an empty document yields the defaults
    ///
    /// # Errors
    /// - `serde_yaml::Error` on malformed YAML or unknown keys
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Override fields from `lookup`, which maps a key to its value
    ///
    /// # Errors
    /// - `ConfigError::Env` if a present value does not parse
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRIES") {
            self.tries = parse_env("TRIES", v)?;
        }
        if let Some(v) = lookup("AMT_WORKERS") {
            self.amt_workers = parse_env("AMT_WORKERS", v)?;
        }
        if let Some(v) = lookup("AMOUNT_OF_EVAL_SAMPLES") {
            self.amount_of_eval_samples = parse_env("AMOUNT_OF_EVAL_SAMPLES", v)?;
        }
        if let Some(v) = lookup("METRICS_NAME") {
            self.metrics_name = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm_model = v;
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm_base_url = v;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm_api_key = Some(v);
        }
        if let Some(v) = lookup("LLM_BACKEND") {
            self.llm_backend = parse_env("LLM_BACKEND", v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", v)?;
        }
        if let Some(v) = lookup("READABILITY_URL") {
            self.readability_url = Some(v).filter(|url| !url.trim().is_empty());
        }
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` naming the first bad key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tries == 0 {
            return Err(ConfigError::Invalid {
                key: "TRIES",
                reason: "must be a positive integer".to_string(),
            });
        }
        if self.amt_workers != ALL_CORES && self.amt_workers <= 0 {
            return Err(ConfigError::Invalid {
                key: "AMT_WORKERS",
                reason: format!("must be -1 or positive, got {}", self.amt_workers),
            });
        }
        if self.amount_of_eval_samples < UNLIMITED {
            return Err(ConfigError::Invalid {
                key: "AMOUNT_OF_EVAL_SAMPLES",
                reason: format!("must be -1 or more, got {}", self.amount_of_eval_samples),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                reason: "must be positive".to_string(),
            });
        }
        if self.metrics_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "METRICS_NAME",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Set attempt budget
    #[must_use]
    pub fn with_tries(mut self, tries: usize) -> Self {
        self.tries = tries;
        self
    }

    /// Set worker count (`-1` for all cores)
    #[must_use]
    pub fn with_workers(mut self, workers: i64) -> Self {
        self.amt_workers = workers;
        self
    }

    /// Set eval sample cap (`-1` for none)
    #[must_use]
    pub fn with_eval_samples(mut self, samples: i64) -> Self {
        self.amount_of_eval_samples = samples;
        self
    }

    /// Resolved pool size, never zero
    #[must_use]
    pub fn worker_count(&self) -> usize {
        match usize::try_from(self.amt_workers) {
            Ok(n) if n > 0 => n,
            _ => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    /// Resolved oracle file cap
    #[must_use]
    pub fn eval_sample_cap(&self) -> Option<usize> {
        usize::try_from(self.amount_of_eval_samples).ok()
    }

    /// Per-call network timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings for the retry orchestrator
    #[must_use]
    pub fn rename_settings(&self) -> RenameSettings {
        RenameSettings::default()
            .with_max_attempts(self.tries)
            .with_model(self.llm_model.clone())
    }

    /// Settings for per-worker generator clients
    #[must_use]
    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            backend: self.llm_backend,
            base_url: self.llm_base_url.clone(),
            api_key: self.llm_api_key.clone(),
            timeout: self.request_timeout(),
        }
    }

    /// File name of the eval results
    #[must_use]
    pub fn benchmark_file_name(&self) -> String {
        format!("{}_benchmark_results.json", self.metrics_name)
    }
}

fn parse_env<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}
