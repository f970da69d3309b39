//! Configuration for blueprint-estimator
//!
//! Settings are read from environment variables, with defaults for anything
//! unset.
//!
//! # Environment Variables
//!
//! - `ESTIMATOR_PROVIDER`: genai adapter (gemini|openai|anthropic|ollama|groq|xai|...) - default: "gemini"
//! - `ESTIMATOR_MODEL`: model name - default: "gemini-2.0-flash"
//! - `ESTIMATOR_LLM_TIMEOUT`: LLM timeout in seconds - default: "300"
//! - `ESTIMATOR_LLM_MAX_TOKENS`: completion token limit - default: "8192"
//! - `ESTIMATOR_RENDER_URL`: rendering service endpoint - required for step 4
//! - `ESTIMATOR_RENDER_TIMEOUT`: rendering timeout in seconds - default: "300"
//! - `ESTIMATOR_BUCKET`: bucket the rendered documents go to - default: "estimator-documents"
//! - `ESTIMATOR_COLLECTION`: job document collection - default: "agent_job"
//! - `ESTIMATOR_STORE_DIR`: job document directory - default: `<data dir>/blueprint-estimator/store`
//! - `ESTIMATOR_BLOB_DIR`: blueprint file directory - default: `<data dir>/blueprint-estimator/blobs`
//! - `ESTIMATOR_SIGNED_URL_TTL`: signed URL lifetime in seconds - default: "3600"
//! - `ESTIMATOR_URL_SIGNING_KEY`: key for local signed URLs - default: "local-development-key"
//! - `ESTIMATOR_EXCHANGE_LOG`: JSONL file recording every LLM exchange - default: unset
//! - `ESTIMATOR_LOG_LEVEL`: logging level - default: "info"
//!
//! Provider credentials are read by genai itself (`GEMINI_API_KEY`,
//! `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...).

use crate::llm::{parse_provider, AdapterKind};
use crate::pipeline::PipelineConfig;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROVIDER: &str = "gemini";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LLM_MAX_TOKENS: u32 = 8192;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 300;
const DEFAULT_BUCKET: &str = crate::pipeline::config::DEFAULT_BUCKET;
const DEFAULT_COLLECTION: &str = crate::job::DEFAULT_COLLECTION;
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const DEFAULT_SIGNING_KEY: &str = "local-development-key";
const DEFAULT_LOG_LEVEL: &str = "info";

const MAX_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Use a genai adapter name such as gemini, openai, anthropic or ollama")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// genai adapter name, e.g. "gemini"
    pub provider: String,
    pub model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_tokens: u32,
    pub render_url: Option<String>,
    pub render_timeout_secs: u64,
    pub bucket_name: String,
    pub collection: String,
    pub store_dir: PathBuf,
    pub blob_dir: PathBuf,
    pub signed_url_ttl_secs: u64,
    pub url_signing_key: String,
    pub exchange_log: Option<PathBuf>,
    pub log_level: String,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(env::temp_dir)
        .join("blueprint-estimator")
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for EstimatorConfig {
    /// Loads from `ESTIMATOR_*` environment variables with defaults.
    fn default() -> Self {
        let base = data_dir();
        Self {
            provider: env_nonempty("ESTIMATOR_PROVIDER")
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
                .to_lowercase(),
            model: env_nonempty("ESTIMATOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout_secs: env_parsed("ESTIMATOR_LLM_TIMEOUT", DEFAULT_LLM_TIMEOUT_SECS),
            llm_max_tokens: env_parsed("ESTIMATOR_LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS),
            render_url: env_nonempty("ESTIMATOR_RENDER_URL"),
            render_timeout_secs: env_parsed("ESTIMATOR_RENDER_TIMEOUT", DEFAULT_RENDER_TIMEOUT_SECS),
            bucket_name: env_nonempty("ESTIMATOR_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            collection: env_nonempty("ESTIMATOR_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            store_dir: env_nonempty("ESTIMATOR_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| base.join("store")),
            blob_dir: env_nonempty("ESTIMATOR_BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| base.join("blobs")),
            signed_url_ttl_secs: env_parsed("ESTIMATOR_SIGNED_URL_TTL", DEFAULT_SIGNED_URL_TTL_SECS),
            url_signing_key: env_nonempty("ESTIMATOR_URL_SIGNING_KEY")
                .unwrap_or_else(|| DEFAULT_SIGNING_KEY.to_string()),
            exchange_log: env_nonempty("ESTIMATOR_EXCHANGE_LOG").map(PathBuf::from),
            log_level: env::var("ESTIMATOR_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        }
    }
}

fn check_timeout(name: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be between 1 and {} seconds, got {}",
            name, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

impl EstimatorConfig {
    /// Checks ranges and names. The render URL is only checked when set;
    /// step 4 reports its absence.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.adapter_kind()?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("Model name is empty".to_string()));
        }
        check_timeout("LLM timeout", self.llm_timeout_secs)?;
        check_timeout("Render timeout", self.render_timeout_secs)?;

        if self.llm_max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "LLM max tokens must be at least 1".to_string(),
            ));
        }
        if self.signed_url_ttl_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Signed URL TTL must be at least 1 second".to_string(),
            ));
        }
        if let Some(url) = &self.render_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ParseError {
                    field: "ESTIMATOR_RENDER_URL".to_string(),
                    error: format!("'{}' is not an http(s) URL", url),
                });
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn adapter_kind(&self) -> Result<AdapterKind, ConfigError> {
        parse_provider(&self.provider).ok_or_else(|| ConfigError::InvalidProvider(self.provider.clone()))
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// The subset the step executors need.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_bucket_name(self.bucket_name.clone())
            .with_signed_url_ttl(Duration::from_secs(self.signed_url_ttl_secs))
            .with_max_tokens(self.llm_max_tokens)
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("provider".to_string(), self.provider.clone());
        map.insert("model".to_string(), self.model.clone());
        map.insert("llm_timeout_secs".to_string(), self.llm_timeout_secs.to_string());
        map.insert("llm_max_tokens".to_string(), self.llm_max_tokens.to_string());
        if let Some(url) = &self.render_url {
            map.insert("render_url".to_string(), url.clone());
        }
        map.insert(
            "render_timeout_secs".to_string(),
            self.render_timeout_secs.to_string(),
        );
        map.insert("bucket_name".to_string(), self.bucket_name.clone());
        map.insert("collection".to_string(), self.collection.clone());
        map.insert("store_dir".to_string(), self.store_dir.display().to_string());
        map.insert("blob_dir".to_string(), self.blob_dir.display().to_string());
        map.insert(
            "signed_url_ttl_secs".to_string(),
            self.signed_url_ttl_secs.to_string(),
        );
        if let Some(path) = &self.exchange_log {
            map.insert("exchange_log".to_string(), path.display().to_string());
        }
        map.insert("log_level".to_string(), self.log_level.clone());
        map
    }
}

impl fmt::Display for EstimatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Estimator Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  LLM Timeout: {}s", self.llm_timeout_secs)?;
        writeln!(
            f,
            "  Render URL: {}",
            self.render_url.as_deref().unwrap_or("(not set)")
        )?;
        writeln!(f, "  Render Timeout: {}s", self.render_timeout_secs)?;
        writeln!(f, "  Bucket: {}", self.bucket_name)?;
        writeln!(f, "  Collection: {}", self.collection)?;
        writeln!(f, "  Store Dir: {}", self.store_dir.display())?;
        writeln!(f, "  Blob Dir: {}", self.blob_dir.display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Sets an environment variable and restores the old value on drop.
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("ESTIMATOR_PROVIDER"),
            EnvGuard::unset("ESTIMATOR_MODEL"),
            EnvGuard::unset("ESTIMATOR_LLM_TIMEOUT"),
            EnvGuard::unset("ESTIMATOR_RENDER_URL"),
            EnvGuard::unset("ESTIMATOR_BUCKET"),
            EnvGuard::unset("ESTIMATOR_COLLECTION"),
            EnvGuard::unset("ESTIMATOR_STORE_DIR"),
            EnvGuard::set("ESTIMATOR_LOG_LEVEL", DEFAULT_LOG_LEVEL),
        ];

        let config = EstimatorConfig::default();

        assert_eq!(config.provider, DEFAULT_PROVIDER);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.llm_timeout_secs, DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(config.render_url, None);
        assert_eq!(config.bucket_name, "estimator-documents");
        assert_eq!(config.collection, "agent_job");
        assert!(config.store_dir.ends_with("blueprint-estimator/store"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("ESTIMATOR_PROVIDER", "Anthropic"),
            EnvGuard::set("ESTIMATOR_MODEL", "claude-sonnet-4-5"),
            EnvGuard::set("ESTIMATOR_LLM_TIMEOUT", "120"),
            EnvGuard::set("ESTIMATOR_RENDER_URL", "http://localhost:8080/create"),
            EnvGuard::set("ESTIMATOR_RENDER_TIMEOUT", "abc"),
            EnvGuard::set("ESTIMATOR_STORE_DIR", "/tmp/jobs"),
            EnvGuard::set("ESTIMATOR_LOG_LEVEL", "DEBUG"),
        ];

        let config = EstimatorConfig::default();

        assert_eq!(config.provider, "anthropic");
        assert!(matches!(config.adapter_kind(), Ok(AdapterKind::Anthropic)));
        assert_eq!(config.model, "claude-sonnet-4-5");
        assert_eq!(config.llm_timeout(), Duration::from_secs(120));
        assert_eq!(config.render_url.as_deref(), Some("http://localhost:8080/create"));
        assert_eq!(config.render_timeout_secs, DEFAULT_RENDER_TIMEOUT_SECS);
        assert_eq!(config.store_dir, PathBuf::from("/tmp/jobs"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        let mut config = EstimatorConfig::default();
        config.llm_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.render_timeout_secs = 901;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.provider = "nonexistent".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidProvider(_))));

        let mut config = EstimatorConfig::default();
        config.render_url = Some("ftp://x".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_pipeline_config_subset() {
        let mut config = EstimatorConfig::default();
        config.bucket_name = "quotes".to_string();
        config.signed_url_ttl_secs = 60;
        config.llm_max_tokens = 1000;

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.bucket_name, "quotes");
        assert_eq!(pipeline.signed_url_ttl, Duration::from_secs(60));
        assert_eq!(pipeline.max_tokens, 1000);
    }

    #[test]
    #[serial]
    fn test_config_display() {
        let config = EstimatorConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Estimator Configuration:"));
        assert!(display.contains("Provider:"));
        assert!(config.to_display_map().contains_key("collection"));
    }
}
