use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BRAND_ALIASES_PATH, DEFAULT_KNOWLEDGE_BASE_DIR, DEFAULT_KNOWLEDGE_BASE_KEY, DEFAULT_LOG_DIR,
    DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER, DEFAULT_SAVE_EVERY, DEFAULT_SKIP_LIST_PATH,
};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Where the knowledge base snapshot lives
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_kb_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_kb_key")]
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    #[serde(default = "default_skip_list")]
    pub skip_list: PathBuf,
    #[serde(default = "default_brand_aliases")]
    pub brand_aliases: PathBuf,
    /// Items between knowledge base checkpoints during a batch run
    #[serde(default = "default_save_every")]
    pub save_every: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizationConfig {
    /// Optional TOML file with `[fields.<name>]` rule overrides
    #[serde(default)]
    pub field_rules: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_true")]
    pub file_output: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Write the Prometheus text here after a batch run
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_kb_dir() -> PathBuf { PathBuf::from(DEFAULT_KNOWLEDGE_BASE_DIR) }
fn default_kb_key() -> String { DEFAULT_KNOWLEDGE_BASE_KEY.to_string() }
fn default_skip_list() -> PathBuf { PathBuf::from(DEFAULT_SKIP_LIST_PATH) }
fn default_brand_aliases() -> PathBuf { PathBuf::from(DEFAULT_BRAND_ALIASES_PATH) }
fn default_save_every() -> usize { DEFAULT_SAVE_EVERY }
fn default_log_dir() -> PathBuf { PathBuf::from(DEFAULT_LOG_DIR) }
fn default_log_file() -> String { DEFAULT_LOG_FILE.to_string() }
fn default_log_filter() -> String { DEFAULT_LOG_FILTER.to_string() }
fn default_true() -> bool { true }

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self { dir: default_kb_dir(), key: default_kb_key() }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            skip_list: default_skip_list(),
            brand_aliases: default_brand_aliases(),
            save_every: default_save_every(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file: default_log_file(),
            filter: default_log_filter(),
            file_output: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true, output: None }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&config_content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.matcher.save_every == 0 {
            return Err(CatalogError::Config("matcher.save_every must be at least 1".to_string()));
        }
        Ok(config)
    }
}
