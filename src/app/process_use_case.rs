use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app::ports::{ItemSink, ItemSource, Notifier};
use crate::error::CatalogError;
use crate::observability::metrics;
use crate::pipeline::processing::matcher::{LearningStats, ProductMatcher};
use crate::pipeline::processing::normalize::NormalizationEngine;
use crate::pipeline::processing::postprocess::normalize_price;
use crate::pipeline::processing::slug::item_slug;

/// Totals for one batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_read: u64,
    pub items_written: u64,
    pub items_dropped: u64,
    pub items_malformed: u64,
    pub fields_normalized: u64,
    pub snapshots_saved: u64,
    pub learning: LearningStats,
}

impl RunSummary {
    fn message(&self) -> String {
        format!(
            "run {}: read {}, written {}, dropped {}, malformed {}; learned {} brands and {} models",
            self.run_id,
            self.items_read,
            self.items_written,
            self.items_dropped,
            self.items_malformed,
            self.learning.brands_added,
            self.learning.models_added
        )
    }
}

/// Drains an item source through price cleanup, brand/model matching and
/// attribute normalization, checkpointing the knowledge base as it goes.
pub struct ProcessItemsUseCase {
    matcher: ProductMatcher,
    engine: Arc<NormalizationEngine>,
    source: Box<dyn ItemSource>,
    sink: Box<dyn ItemSink>,
    notifier: Box<dyn Notifier>,
    save_every: usize,
}

impl ProcessItemsUseCase {
    pub fn new(
        matcher: ProductMatcher,
        engine: Arc<NormalizationEngine>,
        source: Box<dyn ItemSource>,
        sink: Box<dyn ItemSink>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            matcher,
            engine,
            source,
            sink,
            notifier,
            save_every: crate::constants::DEFAULT_SAVE_EVERY,
        }
    }

    pub fn with_save_every(mut self, save_every: usize) -> Self {
        self.save_every = save_every.max(1);
        self
    }

    pub fn matcher(&self) -> &ProductMatcher {
        &self.matcher
    }

    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Starting processing run {}", run_id);

        let mut summary = RunSummary {
            run_id,
            started_at,
            finished_at: started_at,
            items_read: 0,
            items_written: 0,
            items_dropped: 0,
            items_malformed: 0,
            fields_normalized: 0,
            snapshots_saved: 0,
            learning: LearningStats::default(),
        };

        if let Err(e) = self.drain(&mut summary).await {
            self.salvage().await;
            return Err(e);
        }

        self.sink.flush().await.context("Failed to flush item sink")?;
        self.matcher.save().await.context("Failed to save knowledge base")?;
        summary.snapshots_saved += 1;

        summary.learning = self.matcher.stats();
        summary.finished_at = Utc::now();
        metrics::process::run_duration(timer.elapsed().as_secs_f64());

        let message = summary.message();
        info!("{}", message);
        if let Err(e) = self.notifier.notify("Catalog processing finished", &message).await {
            warn!("Failed to send run notification: {}", e);
        }

        Ok(summary)
    }

    async fn drain(&mut self, summary: &mut RunSummary) -> Result<()> {
        let mut since_checkpoint = 0usize;

        loop {
            let item = match self.source.dequeue().await {
                Ok(Some(item)) => item,
                Ok(None) => return Ok(()),
                Err(e @ CatalogError::MalformedDocument { .. }) => {
                    warn!("Skipping malformed item: {}", e);
                    summary.items_malformed += 1;
                    metrics::process::item_malformed();
                    continue;
                }
                Err(e) => return Err(e).context("Failed to read from item source"),
            };
            summary.items_read += 1;
            metrics::process::item_read();

            let Some(mut item) = normalize_price(item) else {
                summary.items_dropped += 1;
                metrics::process::item_dropped();
                continue;
            };

            self.matcher.match_with_report(&mut item);
            item.slug = item_slug(&item);
            summary.fields_normalized += self.engine.normalize_item(&mut item) as u64;

            self.sink
                .enqueue(&item)
                .await
                .context("Failed to write processed item")?;
            summary.items_written += 1;
            metrics::process::item_written();

            since_checkpoint += 1;
            if since_checkpoint >= self.save_every {
                self.matcher.save().await.context("Failed to checkpoint knowledge base")?;
                summary.snapshots_saved += 1;
                since_checkpoint = 0;

                // Alias edits apply from the next item on
                if let Err(e) = self.matcher.reload_aliases() {
                    warn!("Keeping previous brand aliases: {}", e);
                }
            }
        }
    }

    /// Keep what a failed run already produced: written items and learned brands.
    async fn salvage(&mut self) {
        if let Err(e) = self.sink.flush().await {
            warn!("Failed to flush item sink after error: {}", e);
        }
        if let Err(e) = self.matcher.save().await {
            warn!("Failed to save knowledge base after error: {}", e);
        }
    }
}
