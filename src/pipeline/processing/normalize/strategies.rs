//! Parsing strategies used by the field rules.
//!
//! Every function here is total: malformed input yields `None` (or
//! [`FloatScan::NotFound`]), never a panic or an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::text::fold;
use crate::constants::{AFFIRMATIVE_TOKENS, NEGATIVE_TOKENS};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digit run pattern"));

// Alternation order matters: a fractional number is preferred over a bare
// integer at the same starting position.
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?[0-9]*\.[0-9]+|[0-9]+").expect("decimal pattern"));

/// Return the canonical value of the first pattern contained in `value`.
///
/// `mapping` is scanned in declared order, so earlier patterns win when more
/// than one is a substring of the folded input.
pub fn canonical_substring(value: &str, mapping: &[(String, String)]) -> Option<String> {
    let folded = fold(value);
    mapping
        .iter()
        .find(|(pattern, _)| folded.contains(pattern.as_str()))
        .map(|(_, canonical)| canonical.clone())
}

/// `true` when `keyword` occurs anywhere in the folded value.
pub fn contains_keyword(value: &str, keyword: &str) -> bool {
    fold(value).contains(keyword)
}

/// Scan whitespace-separated tokens left to right for a yes/no answer.
pub fn find_boolean(value: &str) -> Option<bool> {
    let folded = fold(value);
    for word in folded.split_whitespace() {
        if AFFIRMATIVE_TOKENS.contains(&word) {
            return Some(true);
        }
        if NEGATIVE_TOKENS.contains(&word) {
            return Some(false);
        }
    }
    None
}

/// Up to `count` leading digit runs, in order of appearance.
///
/// Returns `None` if any of the collected runs does not fit in an `i64`.
pub fn find_integers(value: &str, count: usize) -> Option<Vec<i64>> {
    DIGIT_RUN
        .find_iter(value)
        .take(count)
        .map(|m| m.as_str().parse::<i64>().ok())
        .collect()
}

/// The leftmost digit run of `value`.
pub fn find_integer(value: &str) -> Option<i64> {
    find_integers(value, 1)?.first().copied()
}

/// Exactly `count` integers joined by `join_char` ("1920 x 1080" → "1920x1080").
///
/// Each integer appears once: "30 x 40 x 50" with `count = 3` gives
/// "30x40x50" rather than the overlapping pairs "30x4040x50".
pub fn find_joined_integers(value: &str, count: usize, join_char: &str) -> Option<String> {
    let integers = find_integers(value, count)?;
    if count == 0 || integers.len() != count {
        return None;
    }
    let parts: Vec<String> = integers.iter().map(|i| i.to_string()).collect();
    Some(parts.join(join_char))
}

/// A number extracted by [`find_float`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Float(f64),
    Integer(i64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Float(f) => f,
            Number::Integer(i) => i as f64,
        }
    }
}

/// Result of a float scan. Out-of-range is kept apart from not-found so
/// callers that care can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FloatScan {
    Found(Number),
    NotFound,
    OutOfRange,
}

impl FloatScan {
    pub fn number(self) -> Option<Number> {
        match self {
            FloatScan::Found(n) => Some(n),
            FloatScan::NotFound | FloatScan::OutOfRange => None,
        }
    }
}

/// Rewrite decimal separators so the number parses with a `.` point.
///
/// With both `.` and `,` present the dot is a thousands separator
/// ("1.234,56" → "1234.56"); otherwise a comma is the decimal point.
pub fn normalize_decimal_separators(value: &str) -> String {
    let value = if value.contains('.') && value.contains(',') {
        value.replace('.', "")
    } else {
        value.to_string()
    };
    value.replace(',', ".")
}

/// Extract the first decimal number of `value`.
///
/// When `keep_right_zeros` is false an integral value is narrowed to
/// [`Number::Integer`]. Values above `limit` are reported as out of range.
pub fn find_float(value: &str, limit: Option<f64>, keep_right_zeros: bool) -> FloatScan {
    let text = normalize_decimal_separators(value);

    let Some(found) = DECIMAL.find(&text) else {
        return FloatScan::NotFound;
    };
    let Ok(parsed) = found.as_str().parse::<f64>() else {
        return FloatScan::NotFound;
    };

    let number = if !keep_right_zeros && parsed.is_finite() && parsed.fract() == 0.0 && fits_i64(parsed) {
        Number::Integer(parsed as i64)
    } else {
        Number::Float(parsed)
    };

    match limit {
        Some(limit) if number.as_f64() > limit => FloatScan::OutOfRange,
        _ => FloatScan::Found(number),
    }
}

fn fits_i64(value: f64) -> bool {
    value >= i64::MIN as f64 && value < i64::MAX as f64
}
