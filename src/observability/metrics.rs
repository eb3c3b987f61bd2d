//! Metrics for the catalog pipeline.
//!
//! Every metric name lives in [`MetricName`]; recording goes through the
//! phase modules below (`matcher`, `normalize`, `process`). Until [`init`]
//! installs the Prometheus recorder, recording is a no-op.

use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Matcher metrics
    MatcherItemsMatched,
    MatcherItemsQuarantined,
    MatcherBrandsLearned,
    MatcherModelsLearned,
    MatcherBrandsInferred,
    MatcherModelsInferred,
    MatcherBrandsCanonicalized,
    MatcherSnapshotsSaved,

    // Normalize metrics
    NormalizeFieldsNormalized,
    NormalizeFieldsOutOfRange,

    // Process metrics
    ProcessItemsRead,
    ProcessItemsWritten,
    ProcessItemsDropped,
    ProcessItemsMalformed,
    ProcessRunDuration,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::MatcherItemsMatched => "catalog_matcher_items_matched_total",
            MetricName::MatcherItemsQuarantined => "catalog_matcher_items_quarantined_total",
            MetricName::MatcherBrandsLearned => "catalog_matcher_brands_learned_total",
            MetricName::MatcherModelsLearned => "catalog_matcher_models_learned_total",
            MetricName::MatcherBrandsInferred => "catalog_matcher_brands_inferred_total",
            MetricName::MatcherModelsInferred => "catalog_matcher_models_inferred_total",
            MetricName::MatcherBrandsCanonicalized => "catalog_matcher_brands_canonicalized_total",
            MetricName::MatcherSnapshotsSaved => "catalog_matcher_snapshots_saved_total",

            MetricName::NormalizeFieldsNormalized => "catalog_normalize_fields_normalized_total",
            MetricName::NormalizeFieldsOutOfRange => "catalog_normalize_fields_out_of_range_total",

            MetricName::ProcessItemsRead => "catalog_process_items_read_total",
            MetricName::ProcessItemsWritten => "catalog_process_items_written_total",
            MetricName::ProcessItemsDropped => "catalog_process_items_dropped_total",
            MetricName::ProcessItemsMalformed => "catalog_process_items_malformed_total",
            MetricName::ProcessRunDuration => "catalog_process_run_duration_seconds",
        }
    }

    /// All metric names, in declaration order
    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            MatcherItemsMatched,
            MatcherItemsQuarantined,
            MatcherBrandsLearned,
            MatcherModelsLearned,
            MatcherBrandsInferred,
            MatcherModelsInferred,
            MatcherBrandsCanonicalized,
            MatcherSnapshotsSaved,
            NormalizeFieldsNormalized,
            NormalizeFieldsOutOfRange,
            ProcessItemsRead,
            ProcessItemsWritten,
            ProcessItemsDropped,
            ProcessItemsMalformed,
            ProcessRunDuration,
        ]
        .into_iter()
    }

    /// (phase, description)
    pub fn metadata(&self) -> (&'static str, &'static str) {
        match self {
            MetricName::MatcherItemsMatched => ("matcher", "Items passed through the product matcher"),
            MetricName::MatcherItemsQuarantined => ("matcher", "Items whose brand was on the skip list"),
            MetricName::MatcherBrandsLearned => ("matcher", "New brands added to the knowledge base"),
            MetricName::MatcherModelsLearned => ("matcher", "New models added to the knowledge base"),
            MetricName::MatcherBrandsInferred => ("matcher", "Brands inferred from the title"),
            MetricName::MatcherModelsInferred => ("matcher", "Models inferred from the title"),
            MetricName::MatcherBrandsCanonicalized => ("matcher", "Brands replaced by their canonical alias"),
            MetricName::MatcherSnapshotsSaved => ("matcher", "Knowledge base snapshots written"),
            MetricName::NormalizeFieldsNormalized => ("normalize", "Attribute values normalized"),
            MetricName::NormalizeFieldsOutOfRange => ("normalize", "Numeric values above their field limit"),
            MetricName::ProcessItemsRead => ("process", "Items read from the source"),
            MetricName::ProcessItemsWritten => ("process", "Items written to the sink"),
            MetricName::ProcessItemsDropped => ("process", "Items dropped for lack of a price"),
            MetricName::ProcessItemsMalformed => ("process", "Source lines that were not valid items"),
            MetricName::ProcessRunDuration => ("process", "Batch run duration"),
        }
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it again is a no-op.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        debug!("Metrics recorder already installed");
        return Ok(());
    }

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();

    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics in Prometheus text format, if [`init`] ran.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Matcher Metrics
// ============================================================================

pub mod matcher {
    use super::MetricName;

    pub fn item_matched() {
        ::metrics::counter!(MetricName::MatcherItemsMatched.as_str()).increment(1);
    }

    pub fn item_quarantined() {
        ::metrics::counter!(MetricName::MatcherItemsQuarantined.as_str()).increment(1);
    }

    pub fn brand_learned() {
        ::metrics::counter!(MetricName::MatcherBrandsLearned.as_str()).increment(1);
    }

    pub fn model_learned() {
        ::metrics::counter!(MetricName::MatcherModelsLearned.as_str()).increment(1);
    }

    pub fn brand_inferred() {
        ::metrics::counter!(MetricName::MatcherBrandsInferred.as_str()).increment(1);
    }

    pub fn model_inferred() {
        ::metrics::counter!(MetricName::MatcherModelsInferred.as_str()).increment(1);
    }

    pub fn brand_canonicalized() {
        ::metrics::counter!(MetricName::MatcherBrandsCanonicalized.as_str()).increment(1);
    }

    pub fn snapshot_saved() {
        ::metrics::counter!(MetricName::MatcherSnapshotsSaved.as_str()).increment(1);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn fields_normalized(count: u64) {
        ::metrics::counter!(MetricName::NormalizeFieldsNormalized.as_str()).increment(count);
    }

    pub fn fields_out_of_range(count: u64) {
        ::metrics::counter!(MetricName::NormalizeFieldsOutOfRange.as_str()).increment(count);
    }
}

// ============================================================================
// Process Metrics
// ============================================================================

pub mod process {
    use super::MetricName;

    pub fn item_read() {
        ::metrics::counter!(MetricName::ProcessItemsRead.as_str()).increment(1);
    }

    pub fn item_written() {
        ::metrics::counter!(MetricName::ProcessItemsWritten.as_str()).increment(1);
    }

    pub fn item_dropped() {
        ::metrics::counter!(MetricName::ProcessItemsDropped.as_str()).increment(1);
    }

    pub fn item_malformed() {
        ::metrics::counter!(MetricName::ProcessItemsMalformed.as_str()).increment(1);
    }

    pub fn run_duration(secs: f64) {
        ::metrics::histogram!(MetricName::ProcessRunDuration.as_str()).record(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: HashSet<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), MetricName::all_metrics().count());
        assert!(names.iter().all(|n| n.starts_with("catalog_")));
    }

    #[test]
    fn test_metadata_phase_matches_name() {
        for metric in MetricName::all_metrics() {
            let (phase, description) = metric.metadata();
            assert!(metric.as_str().contains(phase), "{} not in {}", phase, metric);
            assert!(!description.is_empty());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        matcher::item_matched();
        normalize::fields_normalized(3);
        process::run_duration(0.5);
    }
}
