//! src/formats.rs
//!
//! Display helpers applied to message text before rendering.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::message::Message;

// Code spans are matched first so their contents are never rewritten.
static BRACKET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(```[\s\S]*?```|`.*?`)|\\\[([\s\S]*?[^\\])\\\]|\\\((.*?)\\\)").unwrap()
});

static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<title>(.*?)</title>").unwrap());

static SVG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<svg.*?</svg>").unwrap());

/// Escapes `$` before a digit so currency amounts are not read as LaTeX.
pub fn escape_dollar_number(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|next| next.is_ascii_digit()) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Rewrites `\[..\]` and `\(..\)` LaTeX delimiters into `$$` / `$` form,
/// leaving fenced and inline code untouched.
pub fn escape_brackets(text: &str) -> String {
    BRACKET_PATTERN
        .replace_all(text, |caps: &Captures| {
            let non_empty = |idx| caps.get(idx).map(|m| m.as_str()).filter(|s| !s.is_empty());

            if let Some(code) = non_empty(1) {
                code.to_string()
            } else if let Some(block) = non_empty(2) {
                format!("\n$$\n{block}\n$$\n")
            } else if let Some(inline) = non_empty(3) {
                format!("${inline}$")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Text of the first `<title>` element, trimmed.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .filter(|m| !m.as_str().is_empty())
        .map(|m| m.as_str().trim().to_string())
}

/// Drops blank lines inside `<svg>` blocks, which break inline SVG rendering.
pub fn remove_svg_empty_lines(text: &str) -> String {
    SVG_PATTERN
        .replace_all(text, |caps: &Captures| {
            caps[0]
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .into_owned()
}

/// Appends `<sup>n</sup>` citation markers after each grounded segment.
pub fn with_gemini_grounding(message: &Message) -> String {
    let Some(supports) = message
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.grounding_metadata.as_ref())
        .and_then(|grounding| grounding.grounding_supports.as_ref())
    else {
        return message.content.clone();
    };

    supports.iter().fold(message.content.clone(), |content, support| {
        let text = &support.segment.text;
        let nodes = support
            .grounding_chunk_indices
            .iter()
            .map(|index| format!("<sup>{}</sup>", index + 1))
            .collect::<Vec<_>>()
            .join(" ");
        content.replacen(text.as_str(), &format!("{text} {nodes}"), 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{GroundingMetadata, GroundingSegment, GroundingSupport, MessageMetadata};

    #[test]
    fn dollar_before_digit_is_escaped() {
        assert_eq!(escape_dollar_number("costs $5 or $x"), r"costs \$5 or $x");
        assert_eq!(escape_dollar_number("trailing $"), "trailing $");
        assert_eq!(escape_dollar_number("$$1"), r"$\$1");
    }

    #[test]
    fn brackets_become_dollars() {
        assert_eq!(escape_brackets(r"inline \(x^2\) here"), "inline $x^2$ here");
        assert_eq!(escape_brackets(r"\[a+b\]"), "\n$$\na+b\n$$\n");
    }

    #[test]
    fn code_is_left_alone() {
        let text = "`\\(x\\)` and ```\n\\[y\\]\n```";
        assert_eq!(escape_brackets(text), text);
    }

    #[test]
    fn empty_inline_math_is_kept() {
        assert_eq!(escape_brackets(r"\(\)"), r"\(\)");
    }

    #[test]
    fn title_extraction() {
        assert_eq!(
            extract_title("<html><TITLE>  Hello  </TITLE></html>"),
            Some("Hello".to_string())
        );
        assert_eq!(extract_title("<title></title>"), None);
        assert_eq!(extract_title("<p>no title</p>"), None);
    }

    #[test]
    fn svg_blank_lines_removed() {
        let text = "before\n\n<svg>\n  \n<rect/>\n\n</svg>\n\nafter";
        assert_eq!(
            remove_svg_empty_lines(text),
            "before\n\n<svg>\n<rect/>\n</svg>\n\nafter"
        );
    }

    #[test]
    fn grounding_adds_citations() {
        let mut message = Message::assistant("Rust is fast. It is safe.");
        assert_eq!(with_gemini_grounding(&message), message.content);

        message.metadata = Some(MessageMetadata {
            grounding_metadata: Some(GroundingMetadata {
                grounding_supports: Some(vec![GroundingSupport {
                    segment: GroundingSegment {
                        text: "Rust is fast.".into(),
                    },
                    grounding_chunk_indices: vec![0, 2],
                }]),
            }),
            ..Default::default()
        });
        assert_eq!(
            with_gemini_grounding(&message),
            "Rust is fast. <sup>1</sup> <sup>3</sup> It is safe."
        );
    }
}
