//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `GEOCOMPLY_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_CACHE_PATH};
use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_THRESHOLD, DEFAULT_EMBEDDING_DIM};
use crate::embedding::{DenseEmbedderConfig, RerankerConfig};
use crate::fewshot::FewShotConfig;
use crate::llm::{DEFAULT_LLM_MODEL, DEFAULT_LLM_TEMPERATURE, LlmConfig};
use crate::vectordb::DEFAULT_COLLECTION_NAME;

/// Default Qdrant URL used when `GEOCOMPLY_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GEOCOMPLY_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port. Default: `8000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Law collection. Default: `laws`.
    pub collection: String,

    /// Dense embedder checkpoint directory; unset runs the stub embedder.
    pub embedder_path: Option<PathBuf>,

    pub embedding_dim: usize,

    /// Cross-encoder checkpoint directory.
    pub reranker_path: Option<PathBuf>,

    pub rerank: bool,

    pub llm_model: String,
    pub llm_temperature: f64,

    /// Semantic cache mirror file.
    pub cache_path: PathBuf,
    pub cache_threshold: f32,
    pub cache_capacity: usize,

    /// Reviewer feedback stream (JSONL).
    pub feedback_path: PathBuf,
    /// Classification log stream (JSONL).
    pub log_path: PathBuf,

    pub few_shot: bool,
    pub max_positive: usize,
    pub max_negative: usize,

    pub store_timeout_ms: u64,
    pub llm_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            embedder_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            reranker_path: None,
            rerank: true,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: DEFAULT_LLM_TEMPERATURE,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            cache_threshold: DEFAULT_CACHE_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            feedback_path: PathBuf::from("./.data/feedback.jsonl"),
            log_path: PathBuf::from("./.data/classifications.jsonl"),
            few_shot: true,
            max_positive: 1,
            max_negative: 1,
            store_timeout_ms: 10_000,
            llm_timeout_ms: 60_000,
        }
    }
}

impl Config {
    pub const ENV_PORT: &'static str = "GEOCOMPLY_PORT";
    pub const ENV_BIND_ADDR: &'static str = "GEOCOMPLY_BIND_ADDR";
    const ENV_QDRANT_URL: &'static str = "GEOCOMPLY_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "GEOCOMPLY_COLLECTION";
    const ENV_EMBEDDER_PATH: &'static str = "GEOCOMPLY_EMBEDDER_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "GEOCOMPLY_EMBEDDING_DIM";
    const ENV_RERANKER_PATH: &'static str = "GEOCOMPLY_RERANKER_PATH";
    const ENV_RERANK: &'static str = "GEOCOMPLY_RERANK";
    const ENV_LLM_MODEL: &'static str = "GEOCOMPLY_LLM_MODEL";
    const ENV_LLM_TEMPERATURE: &'static str = "GEOCOMPLY_LLM_TEMPERATURE";
    const ENV_CACHE_PATH: &'static str = "GEOCOMPLY_CACHE_PATH";
    const ENV_CACHE_THRESHOLD: &'static str = "GEOCOMPLY_CACHE_THRESHOLD";
    const ENV_CACHE_CAPACITY: &'static str = "GEOCOMPLY_CACHE_CAPACITY";
    const ENV_FEEDBACK_PATH: &'static str = "GEOCOMPLY_FEEDBACK_PATH";
    const ENV_LOG_PATH: &'static str = "GEOCOMPLY_LOG_PATH";
    const ENV_FEW_SHOT: &'static str = "GEOCOMPLY_FEW_SHOT";
    const ENV_MAX_POSITIVE: &'static str = "GEOCOMPLY_MAX_POSITIVE";
    const ENV_MAX_NEGATIVE: &'static str = "GEOCOMPLY_MAX_NEGATIVE";
    const ENV_STORE_TIMEOUT_MS: &'static str = "GEOCOMPLY_STORE_TIMEOUT_MS";
    const ENV_LLM_TIMEOUT_MS: &'static str = "GEOCOMPLY_LLM_TIMEOUT_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(d.port)?,
            bind_addr: Self::parse_bind_addr_from_env(d.bind_addr)?,
            qdrant_url: Self::parse_string_from_env(Self::ENV_QDRANT_URL, d.qdrant_url),
            collection: Self::parse_string_from_env(Self::ENV_COLLECTION, d.collection),
            embedder_path: Self::parse_optional_path_from_env(Self::ENV_EMBEDDER_PATH),
            embedding_dim: Self::parse_from_env(Self::ENV_EMBEDDING_DIM, d.embedding_dim)?,
            reranker_path: Self::parse_optional_path_from_env(Self::ENV_RERANKER_PATH),
            rerank: Self::parse_bool_from_env(Self::ENV_RERANK, d.rerank)?,
            llm_model: Self::parse_string_from_env(Self::ENV_LLM_MODEL, d.llm_model),
            llm_temperature: Self::parse_from_env(Self::ENV_LLM_TEMPERATURE, d.llm_temperature)?,
            cache_path: Self::parse_path_from_env(Self::ENV_CACHE_PATH, d.cache_path),
            cache_threshold: Self::parse_from_env(Self::ENV_CACHE_THRESHOLD, d.cache_threshold)?,
            cache_capacity: Self::parse_from_env(Self::ENV_CACHE_CAPACITY, d.cache_capacity)?,
            feedback_path: Self::parse_path_from_env(Self::ENV_FEEDBACK_PATH, d.feedback_path),
            log_path: Self::parse_path_from_env(Self::ENV_LOG_PATH, d.log_path),
            few_shot: Self::parse_bool_from_env(Self::ENV_FEW_SHOT, d.few_shot)?,
            max_positive: Self::parse_from_env(Self::ENV_MAX_POSITIVE, d.max_positive)?,
            max_negative: Self::parse_from_env(Self::ENV_MAX_NEGATIVE, d.max_negative)?,
            store_timeout_ms: Self::parse_from_env(Self::ENV_STORE_TIMEOUT_MS, d.store_timeout_ms)?,
            llm_timeout_ms: Self::parse_from_env(Self::ENV_LLM_TIMEOUT_MS, d.llm_timeout_ms)?,
        })
    }

    /// Validates paths and numeric ranges (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.embedder_path {
            Self::require_dir(path)?;
        }
        if let Some(path) = &self.reranker_path {
            Self::require_dir(path)?;
        }
        for path in [&self.cache_path, &self.feedback_path, &self.log_path] {
            if path.is_dir() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if self.collection.trim().is_empty() {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_COLLECTION,
                reason: "must not be empty".to_string(),
            });
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_EMBEDDING_DIM,
                reason: "must be > 0".to_string(),
            });
        }
        if !self.cache_threshold.is_finite() || !(0.0..=1.0).contains(&self.cache_threshold) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_CACHE_THRESHOLD,
                reason: format!("must be in [0, 1], got {}", self.cache_threshold),
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_CACHE_CAPACITY,
                reason: "must be > 0".to_string(),
            });
        }
        if !self.llm_temperature.is_finite() || !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_LLM_TEMPERATURE,
                reason: format!("must be in [0, 2], got {}", self.llm_temperature),
            });
        }
        for (name, value) in [
            (Self::ENV_STORE_TIMEOUT_MS, self.store_timeout_ms),
            (Self::ENV_LLM_TIMEOUT_MS, self.llm_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    reason: "must be > 0".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn embedder_config(&self) -> DenseEmbedderConfig {
        let config = match &self.embedder_path {
            Some(path) => DenseEmbedderConfig::new(path.clone()),
            None => DenseEmbedderConfig::stub(),
        };
        config.with_embedding_dim(self.embedding_dim)
    }

    pub fn reranker_config(&self) -> RerankerConfig {
        match &self.reranker_path {
            Some(path) => RerankerConfig::new(path.clone()),
            None => RerankerConfig::unloaded(),
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache_path.clone())
            .with_threshold(self.cache_threshold)
            .with_capacity(self.cache_capacity)
    }

    pub fn few_shot_config(&self) -> FewShotConfig {
        FewShotConfig {
            enabled: self.few_shot,
            max_positive: self.max_positive,
            max_negative: self.max_negative,
        }
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::new(self.llm_model.clone()).with_temperature(self.llm_temperature)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    fn require_dir(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_path_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => {
                value
                    .trim()
                    .parse()
                    .map_err(|e: T::Err| ConfigError::InvalidValue {
                        name: var_name,
                        value: value.clone(),
                        reason: e.to_string(),
                    })
            }
            _ => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected a boolean".to_string(),
                }),
            },
            Err(_) => Ok(default),
        }
    }
}
