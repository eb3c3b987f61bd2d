use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::common::text::normalize_key;

/// One brand and the models learned for it, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandEntry {
    pub brand: String,
    #[serde(default)]
    pub models: Vec<String>,
}

/// Learned brand → model-list mapping.
///
/// Brands iterate in insertion order so longest-first ties resolve the same
/// way on every run. Keys and models are stored lowercase-trimmed, and no
/// brand holds the same model twice.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<BrandEntry>,
    index: HashMap<String, usize>,
}

impl PartialEq for KnowledgeBase {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(brand, models)` pairs, re-applying key normalization and
    /// dropping duplicates. Blank brands and models are skipped.
    pub fn from_entries<I, M>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, M)>,
        M: IntoIterator<Item = String>,
    {
        let mut kb = Self::new();
        for (brand, models) in entries {
            let Some(brand) = normalize_key(Some(&brand)) else {
                continue;
            };
            kb.insert_brand(&brand);
            for model in models {
                if let Some(model) = normalize_key(Some(&model)) {
                    kb.insert_model(&brand, &model);
                }
            }
        }
        kb
    }

    pub fn contains_brand(&self, brand: &str) -> bool {
        self.index.contains_key(brand)
    }

    pub fn contains_model(&self, brand: &str, model: &str) -> bool {
        self.models(brand)
            .map(|models| models.iter().any(|m| m == model))
            .unwrap_or(false)
    }

    /// Insert `brand` with no models. Returns `false` if it was already known.
    pub fn insert_brand(&mut self, brand: &str) -> bool {
        if self.index.contains_key(brand) {
            return false;
        }
        self.index.insert(brand.to_string(), self.entries.len());
        self.entries.push(BrandEntry {
            brand: brand.to_string(),
            models: Vec::new(),
        });
        true
    }

    /// Append `model` under `brand`. Returns `false` if the brand is unknown
    /// or already has that model.
    pub fn insert_model(&mut self, brand: &str, model: &str) -> bool {
        let Some(&slot) = self.index.get(brand) else {
            return false;
        };
        let models = &mut self.entries[slot].models;
        if models.iter().any(|m| m == model) {
            return false;
        }
        models.push(model.to_string());
        true
    }

    pub fn models(&self, brand: &str) -> Option<&[String]> {
        self.index
            .get(brand)
            .map(|&slot| self.entries[slot].models.as_slice())
    }

    /// Known brands in insertion order
    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.brand.as_str())
    }

    pub fn entries(&self) -> &[BrandEntry] {
        &self.entries
    }

    pub fn brand_count(&self) -> usize {
        self.entries.len()
    }

    pub fn model_count(&self) -> usize {
        self.entries.iter().map(|e| e.models.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_deduplicating() {
        let mut kb = KnowledgeBase::new();
        assert!(kb.insert_brand("sony"));
        assert!(!kb.insert_brand("sony"));
        assert!(kb.insert_model("sony", "xperia"));
        assert!(!kb.insert_model("sony", "xperia"));
        assert!(!kb.insert_model("lg", "k10"));

        assert_eq!(kb.models("sony"), Some(&["xperia".to_string()][..]));
        assert_eq!(kb.brand_count(), 1);
        assert_eq!(kb.model_count(), 1);
    }

    #[test]
    fn test_brands_keep_insertion_order() {
        let mut kb = KnowledgeBase::new();
        for brand in ["samsung", "lg", "acer", "bgh"] {
            kb.insert_brand(brand);
        }
        let brands: Vec<&str> = kb.brands().collect();
        assert_eq!(brands, vec!["samsung", "lg", "acer", "bgh"]);
    }

    #[test]
    fn test_from_entries_normalizes_and_dedups() {
        let kb = KnowledgeBase::from_entries(vec![
            (" Sony ".to_string(), vec!["Xperia".to_string(), "xperia ".to_string(), " ".to_string()]),
            ("".to_string(), vec!["orphan".to_string()]),
            ("sony".to_string(), vec!["bravia".to_string()]),
        ]);

        assert_eq!(kb.brand_count(), 1);
        assert_eq!(
            kb.models("sony"),
            Some(&["xperia".to_string(), "bravia".to_string()][..])
        );
        assert!(kb.contains_model("sony", "bravia"));
        assert!(!kb.contains_model("sony", "orphan"));
    }
}
