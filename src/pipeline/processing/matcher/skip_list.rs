use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::common::text::normalize_key;
use crate::error::{CatalogError, Result};

#[derive(Debug, Deserialize)]
struct SkipListDocument {
    brands: Vec<String>,
    models: Vec<String>,
}

/// Brands and models that are known extraction artifacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkipList {
    brands: HashSet<String>,
    models: HashSet<String>,
}

impl SkipList {
    pub fn new<B, M>(brands: B, models: M) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            brands: brands.into_iter().filter_map(|b| normalize_key(Some(b.as_ref()))).collect(),
            models: models.into_iter().filter_map(|m| normalize_key(Some(m.as_ref()))).collect(),
        }
    }

    /// Parse `{"brands": [...], "models": [...]}`. Both lists are required.
    pub fn from_json_str(source_name: &str, content: &str) -> Result<Self> {
        let doc: SkipListDocument = serde_json::from_str(content)
            .map_err(|e| CatalogError::malformed("skip list", source_name, e.to_string()))?;
        Ok(Self::new(doc.brands, doc.models))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read skip list '{}': {}", path.display(), e))
        })?;
        let skip = Self::from_json_str(&path.display().to_string(), &content)?;
        info!(
            "Loaded skip list from {} ({} brands, {} models)",
            path.display(),
            skip.brands.len(),
            skip.models.len()
        );
        Ok(skip)
    }

    pub fn skips_brand(&self, brand: &str) -> bool {
        self.brands.contains(brand)
    }

    pub fn skips_model(&self, model: &str) -> bool {
        self.models.contains(model)
    }
}
