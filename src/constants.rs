// Default locations (relative to the working directory)
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_KNOWLEDGE_BASE_DIR: &str = "data";
pub const DEFAULT_KNOWLEDGE_BASE_KEY: &str = "knowledge_base.json";
pub const DEFAULT_SKIP_LIST_PATH: &str = "data/skip_list.json";
pub const DEFAULT_BRAND_ALIASES_PATH: &str = "data/brand_aliases.json";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "catalog.log";
pub const DEFAULT_LOG_FILTER: &str = "shopper_catalog=info";

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "SHOPPER_CATALOG_CONFIG";

/// Number of processed items between knowledge base checkpoints
pub const DEFAULT_SAVE_EVERY: usize = 500;

/// Current knowledge base snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Affirmative and negative tokens recognised by the boolean rule
pub const AFFIRMATIVE_TOKENS: &[&str] = &["si", "true"];
pub const NEGATIVE_TOKENS: &[&str] = &["no", "false"];
