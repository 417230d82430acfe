//! src/tags.rs
//!
//! Tag literals and scanning helpers shared by the detectors.

use once_cell::sync::Lazy;
use regex::Regex;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

pub const DETAILS_OPEN: &str = "<details";
pub const DETAILS_CLOSE: &str = "</details>";
pub const SUMMARY_OPEN: &str = "<summary>";
pub const SUMMARY_CLOSE: &str = "</summary>";

pub const MARKER_DELIMITER: &str = "###";
pub const MARKER_THINKING: &str = "Thinking";
pub const MARKER_RESPONSE: &str = "Response";

/// `<think>` at the very start, up to and including the first `</think>`.
pub static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A<think>(.*?)</think>").unwrap());

/// First `<details ...>` (attributes ignored) through the next `</details>`.
pub static DETAILS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<details[^>]*>(.*?)</details>").unwrap());

/// Summary label followed by the folded body.
pub static SUMMARY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<summary>(.*?)</summary>(.*)").unwrap());

/// Trims whitespace and byte-order marks from both ends.
///
/// `str::trim` keeps U+FEFF, which would hide a leading `<think>` from the
/// anchored checks.
pub fn trim_content(content: &str) -> &str {
    content.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Byte offset of `needle` in `haystack`, searching from `from` onwards.
pub fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|idx| from + idx)
}

/// Text following the first occurrence of `needle`.
pub fn after<'a>(haystack: &'a str, needle: &str) -> Option<&'a str> {
    haystack
        .find(needle)
        .map(|idx| &haystack[idx + needle.len()..])
}

/// True when every literal in `needles` occurs somewhere in `haystack`.
pub fn contains_all(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().all(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_content_strips_bom() {
        assert_eq!(trim_content("\u{feff} <think>a</think>\n"), "<think>a</think>");
        assert_eq!(trim_content("  plain  "), "plain");
        assert_eq!(trim_content("\u{feff}"), "");
    }

    #[test]
    fn find_from_respects_offset() {
        let text = "</summary><summary>x</summary>";
        assert_eq!(find_from(text, SUMMARY_CLOSE, 0), Some(0));
        assert_eq!(find_from(text, SUMMARY_CLOSE, 1), Some(20));
        assert_eq!(find_from(text, SUMMARY_CLOSE, 100), None);
    }

    #[test]
    fn after_returns_tail() {
        assert_eq!(after("a</think>b</think>c", THINK_CLOSE), Some("b</think>c"));
        assert_eq!(after("abc", THINK_CLOSE), None);
    }

    #[test]
    fn think_block_is_anchored_and_lazy() {
        assert!(THINK_BLOCK.is_match("<think>a\nb</think>c"));
        assert!(!THINK_BLOCK.is_match(" <think>a</think>"));
        let caps = THINK_BLOCK.captures("<think>a</think>b</think>").unwrap();
        assert_eq!(&caps[1], "a");
    }

    #[test]
    fn details_block_ignores_attributes() {
        let caps = DETAILS_BLOCK
            .captures("<details open class=\"x\"><summary>s</summary>r</details>")
            .unwrap();
        assert_eq!(&caps[1], "<summary>s</summary>r");
    }
}
