// Item processing pipeline

pub mod processing;

pub use processing::matcher::{MatchReport, ProductMatcher};
pub use processing::normalize::{NormalizationEngine, Outcome};
