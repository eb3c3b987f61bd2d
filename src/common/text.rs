//! String helpers shared by the normalization engine and the product matcher.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase and strip diacritics ("Acero Inoxidable", "acéro" → "acero ...").
///
/// Decomposes to NFD and drops the combining marks, so `ñ` folds to `n` and
/// `á` to `a`. Characters without a decomposition are kept as they are:
/// this is not a transliteration, so `ß`, `ø` and `æ` survive unchanged.
pub fn fold(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Lowercase and trim a brand/model value. Blank values become `None`.
pub fn normalize_key(value: Option<&str>) -> Option<String> {
    let value = value?.trim().to_lowercase();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Length in characters, used to order brand and model candidates.
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Stable longest-first ordering over `candidates`.
///
/// Candidates of equal length keep their relative order, which makes
/// the first-match tie-break deterministic for a fixed knowledge base.
pub fn longest_first<'a, I>(candidates: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ordered: Vec<&str> = candidates.into_iter().filter(|c| !c.is_empty()).collect();
    ordered.sort_by_key(|c| std::cmp::Reverse(char_len(c)));
    ordered
}
