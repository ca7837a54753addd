//! Runtime configuration, loadable from YAML.
//!
//! ```yaml
//! chunking:
//!   chunk_size: 1000
//!   chunk_overlap: 200
//! retrieval:
//!   top_k: 3
//!   embedding_cache:
//!     max_entries: 10000
//!     ttl: 1h
//! judge:
//!   model: claude-sonnet-4-5
//!   max_tokens: 600
//!   temperature: 0.0
//!   timeout: 30s
//! pipeline:
//!   concurrency: 4
//! ```
//!
//! Every section and field is optional. Durations take human form
//! (`"30s"`, `"2m 30s"`) or a plain number of seconds.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use corroborate_core::ChunkerConfig;

use crate::cache::EmbeddingCache;
use crate::providers::CompletionConfig;
use crate::retriever::DEFAULT_TOP_K;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalConfig,
    pub judge: JudgeConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,

    /// Question embedding cache; absent disables caching
    pub embedding_cache: Option<EmbeddingCacheConfig>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            embedding_cache: Some(EmbeddingCacheConfig::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingCacheConfig {
    pub max_entries: u64,

    #[serde(with = "human_duration")]
    pub ttl: Duration,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl EmbeddingCacheConfig {
    pub fn build(&self) -> EmbeddingCache {
        EmbeddingCache::new(self.max_entries, self.ttl)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JudgeConfig {
    pub model: String,
    pub max_tokens: u32,

    /// 0.0 for deterministic judgments
    pub temperature: f32,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        let defaults = CompletionConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: defaults.timeout,
        }
    }
}

impl JudgeConfig {
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Questions validated at once by `validate_all`
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".to_string()));
        }
        if let Some(cache) = &self.retrieval.embedding_cache {
            if cache.max_entries == 0 {
                return Err(ConfigError::Invalid(
                    "retrieval.embedding_cache.max_entries must be > 0".to_string(),
                ));
            }
        }
        if self.judge.model.trim().is_empty() {
            return Err(ConfigError::Invalid("judge.model must not be empty".to_string()));
        }
        if self.judge.max_tokens == 0 {
            return Err(ConfigError::Invalid("judge.max_tokens must be > 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.judge.temperature) {
            return Err(ConfigError::Invalid(format!(
                "judge.temperature must be within [0, 2], got {}",
                self.judge.temperature
            )));
        }
        if self.judge.timeout.is_zero() {
            return Err(ConfigError::Invalid("judge.timeout must be > 0".to_string()));
        }
        if self.pipeline.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.concurrency must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

mod human_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Human(String),
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Raw::Human(text) => {
                humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
            }
        }
    }
}
