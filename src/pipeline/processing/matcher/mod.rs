//! Brand/model resolution against a learned knowledge base.
//!
//! Every item handed to [`ProductMatcher::match_product`] both teaches the
//! matcher (new brand/model pairs are recorded) and is completed from what it
//! already knows (missing brand or model inferred from the title by longest
//! substring match).

pub mod aliases;
pub mod knowledge_base;
pub mod skip_list;

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub use aliases::BrandAliasTable;
pub use knowledge_base::{BrandEntry, KnowledgeBase};
pub use skip_list::SkipList;

use crate::common::text::{longest_first, normalize_key};
use crate::config::Config;
use crate::error::Result;
use crate::observability::metrics;
use crate::storage::{FsObjectStore, KnowledgeBaseStore, SnapshotStore};
use crate::types::Item;

/// What happened to one item inside the matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub brand_quarantined: bool,
    pub model_quarantined: bool,
    pub brand_learned: bool,
    pub model_learned: bool,
    pub brand_inferred: bool,
    pub model_inferred: bool,
    /// Brand before alias canonicalization, when it changed
    pub canonicalized_from: Option<String>,
}

/// Brands and models added to the knowledge base since the matcher was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearningStats {
    pub brands_added: u64,
    pub models_added: u64,
}

pub struct ProductMatcher {
    knowledge_base: KnowledgeBase,
    skip_list: SkipList,
    aliases: BrandAliasTable,
    aliases_path: Option<PathBuf>,
    store: Arc<dyn KnowledgeBaseStore>,
    stats: LearningStats,
}

impl ProductMatcher {
    pub fn new(
        knowledge_base: KnowledgeBase,
        store: Arc<dyn KnowledgeBaseStore>,
        skip_list: SkipList,
        aliases: BrandAliasTable,
    ) -> Self {
        Self {
            knowledge_base,
            skip_list,
            aliases,
            aliases_path: None,
            store,
            stats: LearningStats::default(),
        }
    }

    /// Load the knowledge base from `store` and build a matcher around it.
    pub async fn open(
        store: Arc<dyn KnowledgeBaseStore>,
        skip_list: SkipList,
        aliases: BrandAliasTable,
    ) -> Result<Self> {
        let knowledge_base = store.load().await?;
        Ok(Self::new(knowledge_base, store, skip_list, aliases))
    }

    /// Build from configuration: filesystem snapshot store, skip list and
    /// alias files. Malformed documents fail here, before any item is seen.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let skip_list = SkipList::from_path(&config.matcher.skip_list)?;
        let aliases = BrandAliasTable::from_path(&config.matcher.brand_aliases)?;
        let store = SnapshotStore::new(
            FsObjectStore::new(config.knowledge_base.dir.clone()),
            config.knowledge_base.key.clone(),
        );

        let mut matcher = Self::open(Arc::new(store), skip_list, aliases).await?;
        matcher.aliases_path = Some(config.matcher.brand_aliases.clone());
        Ok(matcher)
    }

    /// Resolve brand and model of `item`, learning from it on the way.
    pub fn match_product(&mut self, mut item: Item) -> Item {
        self.match_with_report(&mut item);
        item
    }

    pub fn match_with_report(&mut self, item: &mut Item) -> MatchReport {
        item.marca = normalize_key(item.marca.as_deref());
        item.modelo = normalize_key(item.modelo.as_deref());

        let mut report = self.learn(item);
        let title = item.title.as_deref().map(str::to_lowercase);

        if item.marca.is_none() {
            if let Some(title) = &title {
                if let Some(brand) = self.infer_brand(title) {
                    debug!("Inferred brand '{}' from title", brand);
                    item.marca = Some(brand);
                    report.brand_inferred = true;
                    metrics::matcher::brand_inferred();
                }
            }
        }

        if item.modelo.is_none() {
            if let (Some(brand), Some(title)) = (item.marca.as_deref(), &title) {
                if let Some(model) = self.infer_model(brand, title) {
                    debug!("Inferred model '{}' for brand '{}'", model, brand);
                    item.modelo = Some(model);
                    report.model_inferred = true;
                    metrics::matcher::model_inferred();
                }
            }
        }

        if let (Some(brand), Some(_)) = (item.marca.as_deref(), item.modelo.as_deref()) {
            if let Some(canonical) = self.aliases.canonical_for(brand) {
                if canonical != brand {
                    report.canonicalized_from = Some(brand.to_string());
                    metrics::matcher::brand_canonicalized();
                }
                item.marca = Some(canonical);
            }
        }

        metrics::matcher::item_matched();
        report
    }

    /// Record the item's brand/model in the knowledge base, quarantining
    /// skip-listed values. Expects `marca`/`modelo` already normalized.
    pub fn learn(&mut self, item: &mut Item) -> MatchReport {
        let mut report = MatchReport::default();

        if let Some(brand) = item.marca.as_deref() {
            if self.skip_list.skips_brand(brand) {
                debug!("Quarantined brand '{}'", brand);
                item.marca = None;
                item.modelo = None;
                report.brand_quarantined = true;
                metrics::matcher::item_quarantined();
            }
        }

        let Some(brand) = item.marca.as_deref() else {
            return report;
        };

        if self.knowledge_base.insert_brand(brand) {
            self.stats.brands_added += 1;
            report.brand_learned = true;
            metrics::matcher::brand_learned();
        }

        if let Some(model) = item.modelo.as_deref() {
            if self.skip_list.skips_model(model) {
                debug!("Quarantined model '{}' of brand '{}'", model, brand);
                item.modelo = None;
                report.model_quarantined = true;
            } else if self.knowledge_base.insert_model(brand, model) {
                self.stats.models_added += 1;
                report.model_learned = true;
                metrics::matcher::model_learned();
            }
        }

        report
    }

    fn infer_brand(&self, title: &str) -> Option<String> {
        longest_first(self.knowledge_base.brands())
            .into_iter()
            .find(|brand| title.contains(brand))
            .map(str::to_string)
    }

    fn infer_model(&self, brand: &str, title: &str) -> Option<String> {
        let models = self.knowledge_base.models(brand)?;
        longest_first(models.iter().map(String::as_str))
            .into_iter()
            .find(|model| title.contains(model))
            .map(str::to_string)
    }

    /// Write the knowledge base through the store, replacing the previous snapshot.
    pub async fn save(&self) -> Result<()> {
        self.store.save(&self.knowledge_base).await?;
        metrics::matcher::snapshot_saved();
        Ok(())
    }

    /// Re-read the alias file this matcher was configured with. A matcher
    /// built without a file keeps its table.
    pub fn reload_aliases(&mut self) -> Result<()> {
        if let Some(path) = &self.aliases_path {
            self.aliases = BrandAliasTable::from_path(path)?;
            info!("Reloaded brand aliases from {}", path.display());
        }
        Ok(())
    }

    pub fn set_aliases(&mut self, aliases: BrandAliasTable) {
        self.aliases = aliases;
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn stats(&self) -> LearningStats {
        self.stats
    }
}
