//! Per-field attribute normalization.
//!
//! A [`FieldRegistry`] maps field names to [`FieldRule`]s; the
//! [`NormalizationEngine`] dispatches raw attribute text through them. The
//! engine is best-effort: anything it cannot parse is simply left
//! unnormalized.

pub mod registry;
pub mod strategies;

use tracing::{debug, trace};

pub use registry::{FieldRegistry, FieldRule};

use crate::observability::metrics;
use crate::types::{Item, NormalizedValue};
use strategies::{FloatScan, Number};

/// Detailed result of normalizing one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(NormalizedValue),
    /// The field has no registered rule
    NoRule,
    /// The raw value was absent or blank
    Empty,
    /// A rule ran but found nothing to extract
    Unmatched,
    /// A number was found but exceeds the rule's limit
    OutOfRange,
}

impl Outcome {
    pub fn value(self) -> Option<NormalizedValue> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }
}

/// Dispatches raw attribute values through an immutable [`FieldRegistry`].
#[derive(Debug, Clone)]
pub struct NormalizationEngine {
    registry: FieldRegistry,
}

impl NormalizationEngine {
    pub fn new(registry: FieldRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Normalize `raw` for `field`, collapsing every failure to `None`.
    pub fn normalize(&self, field: &str, raw: Option<&str>) -> Option<NormalizedValue> {
        self.resolve(field, raw).value()
    }

    /// Normalize `raw` for `field`, keeping the reason when nothing was produced.
    pub fn resolve(&self, field: &str, raw: Option<&str>) -> Outcome {
        let Some(rule) = self.registry.get(field) else {
            return Outcome::NoRule;
        };
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return Outcome::Empty,
        };

        let outcome = apply_rule(rule, raw);
        trace!(field, raw, ?outcome, "Resolved field");
        outcome
    }

    /// Normalize every attribute of `item` that has a rule, storing the
    /// results in `item.normalized`. Returns how many fields were normalized.
    pub fn normalize_item(&self, item: &mut Item) -> usize {
        let mut normalized = 0;
        let mut out_of_range = 0;

        for (field, value) in &item.attributes {
            let text = crate::types::value_text(value);
            match self.resolve(field, text.as_deref()) {
                Outcome::Value(v) => {
                    item.normalized.insert(field.clone(), v);
                    normalized += 1;
                }
                Outcome::OutOfRange => {
                    debug!("Value for {} is out of range: {:?}", field, text);
                    out_of_range += 1;
                }
                Outcome::NoRule | Outcome::Empty | Outcome::Unmatched => {}
            }
        }

        if normalized > 0 {
            metrics::normalize::fields_normalized(normalized as u64);
        }
        if out_of_range > 0 {
            metrics::normalize::fields_out_of_range(out_of_range);
        }
        normalized
    }
}

impl Default for NormalizationEngine {
    fn default() -> Self {
        Self::new(FieldRegistry::builtin())
    }
}

fn apply_rule(rule: &FieldRule, raw: &str) -> Outcome {
    let value = match rule {
        FieldRule::Canonical { mapping } => {
            strategies::canonical_substring(raw, mapping).map(NormalizedValue::Text)
        }
        FieldRule::ContainsKeyword { keyword } => {
            Some(NormalizedValue::Bool(strategies::contains_keyword(raw, keyword)))
        }
        FieldRule::Boolean => strategies::find_boolean(raw).map(NormalizedValue::Bool),
        FieldRule::Integer { count } if *count <= 1 => {
            strategies::find_integer(raw).map(NormalizedValue::Int)
        }
        FieldRule::Integer { count } => strategies::find_integers(raw, *count)
            .filter(|values| !values.is_empty())
            .map(NormalizedValue::Ints),
        FieldRule::Float { limit, keep_right_zeros } => {
            return match strategies::find_float(raw, *limit, *keep_right_zeros) {
                FloatScan::Found(Number::Integer(i)) => Outcome::Value(NormalizedValue::Int(i)),
                FloatScan::Found(Number::Float(f)) => Outcome::Value(NormalizedValue::Float(f)),
                FloatScan::NotFound => Outcome::Unmatched,
                FloatScan::OutOfRange => Outcome::OutOfRange,
            };
        }
        FieldRule::JoinedIntegers { count, join_char } => {
            strategies::find_joined_integers(raw, *count, join_char).map(NormalizedValue::Text)
        }
        FieldRule::Unparsed => None,
    };

    value.map(Outcome::Value).unwrap_or(Outcome::Unmatched)
}
