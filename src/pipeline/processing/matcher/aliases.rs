use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{CatalogError, Result};

/// Canonical brand names and their alternative spellings, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandAliasTable {
    entries: Vec<(String, HashSet<String>)>,
}

impl BrandAliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alias set. Alternatives are compared uppercased.
    pub fn push<I>(&mut self, canonical: impl Into<String>, alternatives: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let alternatives = alternatives.into_iter().map(|a| a.as_ref().to_uppercase()).collect();
        self.entries.push((canonical.into(), alternatives));
    }

    /// Parse `{"Canonical": ["ALT", ...], ...}`; key order is significant.
    pub fn from_json_str(source_name: &str, content: &str) -> Result<Self> {
        let doc: Map<String, Value> = serde_json::from_str(content)
            .map_err(|e| CatalogError::malformed("brand aliases", source_name, e.to_string()))?;

        let mut table = Self::new();
        for (canonical, alternatives) in doc {
            let Value::Array(values) = alternatives else {
                return Err(CatalogError::malformed(
                    "brand aliases",
                    source_name,
                    format!("alternatives for '{}' must be a list", canonical),
                ));
            };
            let mut spellings = Vec::with_capacity(values.len());
            for value in values {
                match value {
                    Value::String(s) => spellings.push(s),
                    other => {
                        return Err(CatalogError::malformed(
                            "brand aliases",
                            source_name,
                            format!("alternative for '{}' is not a string: {}", canonical, other),
                        ))
                    }
                }
            }
            table.push(canonical, spellings);
        }
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read brand aliases '{}': {}", path.display(), e))
        })?;
        let table = Self::from_json_str(&path.display().to_string(), &content)?;
        info!("Loaded {} brand alias sets from {}", table.len(), path.display());
        Ok(table)
    }

    /// Lowercased canonical name of the first alias set containing `brand`.
    pub fn canonical_for(&self, brand: &str) -> Option<String> {
        let upper = brand.to_uppercase();
        self.entries
            .iter()
            .find(|(_, alternatives)| alternatives.contains(&upper))
            .map(|(canonical, _)| canonical.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
