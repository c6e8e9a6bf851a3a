//! # Strings
//!
//! Text helpers shared by metric labels, alarm names and expression ids

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches every (shortest) substring enclosed in brackets
static STRINGS_IN_BRACKETS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.+?\)").unwrap());

/// Matches one or more whitespace characters
static WHITESPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Marks a bracket as containing a dynamic label placeholder
const DYNAMIC_LABEL_MARKER: &str = "${";

/// Capitalize the first letter, leave the rest as-is
pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalize the first letter, lower-case the rest
pub fn capitalize_first_letter_only(s: &str) -> String {
    capitalize_first_letter(&s.to_lowercase())
}

/// Removes bracketed pieces of a label that contain placeholders
///
/// `"label (avg: ${AVG})"` becomes `"label"`. Annotations do not resolve placeholders, so these
/// have to go before a label is reused for an alarm. Whitespace left behind is collapsed to a
/// single space and the result is trimmed.
pub fn remove_brackets_with_dynamic_labels(label: &str) -> String {
    let mut result = label.to_string();
    for found in STRINGS_IN_BRACKETS_PATTERN.find_iter(label) {
        let bracket = found.as_str();
        if bracket.contains(DYNAMIC_LABEL_MARKER) {
            result = result.replacen(bracket, "", 1);
        }
    }
    WHITESPACE_PATTERN.replace_all(&result, " ").trim().to_string()
}

/// Hash-based id for metric math expressions, see [get_short_hash]
pub fn get_hash_for_metric_expression_id(s: &str) -> String {
    get_short_hash(s)
}

/// Short, stable, non-cryptographic hash of a string as lower-case hex
///
/// 53-bit variant of cyrb53 over the UTF-16 code units of the input. The output is consumed by
/// existing dashboards so the mixing constants must never change.
pub fn get_short_hash(s: &str) -> String {
    const SEED: u32 = 31;
    let mut h1: u32 = 0xdeadbeef ^ SEED;
    let mut h2: u32 = 0x41c6ce57 ^ SEED;

    for ch in s.encode_utf16() {
        let ch = u32::from(ch);
        h1 = (h1 ^ ch).wrapping_mul(2654435761);
        h2 = (h2 ^ ch).wrapping_mul(1597334677);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(2246822507) ^ (h2 ^ (h2 >> 13)).wrapping_mul(3266489909);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(2246822507) ^ (h1 ^ (h1 >> 13)).wrapping_mul(3266489909);

    let hash = (u64::from(h2 & 0x1f_ffff) << 32) | u64::from(h1);
    format!("{hash:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_first_letter_cases() {
        assert_eq!(capitalize_first_letter(""), "");
        assert_eq!(capitalize_first_letter("a"), "A");
        assert_eq!(capitalize_first_letter("aa"), "Aa");
        assert_eq!(capitalize_first_letter("Aa"), "Aa");
        assert_eq!(capitalize_first_letter("AA"), "AA");
    }

    #[test]
    fn capitalize_first_letter_only_cases() {
        assert_eq!(capitalize_first_letter_only(""), "");
        assert_eq!(capitalize_first_letter_only("a"), "A");
        assert_eq!(capitalize_first_letter_only("aa"), "Aa");
        assert_eq!(capitalize_first_letter_only("Aa"), "Aa");
        assert_eq!(capitalize_first_letter_only("AA"), "Aa");
    }

    #[test]
    fn remove_brackets_leaves_plain_labels() {
        assert_eq!(remove_brackets_with_dynamic_labels(""), "");
        assert_eq!(remove_brackets_with_dynamic_labels("abc"), "abc");
        assert_eq!(remove_brackets_with_dynamic_labels("a (b) c"), "a (b) c");
    }

    #[test]
    fn remove_brackets_single_and_multiple() {
        assert_eq!(remove_brackets_with_dynamic_labels("a (b: ${c}) d"), "a d");
        assert_eq!(remove_brackets_with_dynamic_labels("a (b: ${c}) (d: ${e}) f"), "a f");
        assert_eq!(
            remove_brackets_with_dynamic_labels("My (label) with (some ${text}) ${content}."),
            "My (label) with ${content}."
        );
        assert_eq!(remove_brackets_with_dynamic_labels("P99 (avg: ${AVG})"), "P99");
    }

    #[test]
    fn remove_brackets_is_idempotent() {
        for label in ["a (b: ${c}) d", "x (y) (z: ${w})", "  spaced   out ", "(${a})(${b})"] {
            let once = remove_brackets_with_dynamic_labels(label);
            assert_eq!(remove_brackets_with_dynamic_labels(&once), once);
        }
    }

    #[test]
    fn short_hash_vectors() {
        assert_eq!(get_hash_for_metric_expression_id(""), "f56f10af2d6c9");
        assert_eq!(get_hash_for_metric_expression_id("Hello world!"), "ff4e5fadf3425");
    }

    #[test]
    fn short_hash_is_stable() {
        assert_eq!(get_short_hash("Latency"), get_short_hash("Latency"));
        assert_ne!(get_short_hash("Latency"), get_short_hash("latency"));
    }
}
