pub mod common;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod storage;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use error::{CatalogError, Result};
pub use pipeline::processing::matcher::ProductMatcher;
pub use pipeline::processing::normalize::{FieldRegistry, FieldRule, NormalizationEngine, Outcome};
pub use types::{Item, NormalizedValue};

/// Build the normalization engine from the built-in field table plus any
/// configured overrides.
pub fn engine_from_config(config: &config::Config) -> Result<NormalizationEngine> {
    let registry = match &config.normalization.field_rules {
        Some(path) => FieldRegistry::builtin().with_overrides_file(path)?,
        None => FieldRegistry::builtin(),
    };
    Ok(NormalizationEngine::new(registry))
}
