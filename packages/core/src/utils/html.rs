//! HTML to plain text conversion for search indexing
//!
//! Rich text contents are indexed by their visible text only. Block-level
//! tags become whitespace so words from adjacent paragraphs don't merge.

use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex patterns for HTML stripping
///
/// The order of these patterns matters:
/// 1. Non-visible elements (with their bodies) first
/// 2. Comments
/// 3. Block-level and line-break tags become spaces
/// 4. All remaining tags are removed
static HTML_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Remove script/style elements including their contents
        (Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap(), " "),
        // Remove comments
        (Regex::new(r"(?s)<!--.*?-->").unwrap(), ""),
        // Block-level boundaries and line breaks separate words
        (
            Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|blockquote|tr|td|th|table|hr)\b[^>]*>")
                .unwrap(),
            " ",
        ),
        // Remove all other tags
        (Regex::new(r"<[^>]+>").unwrap(), ""),
    ]
});

/// Common named and numeric entities
const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // must be last so decoded ampersands are not decoded again
    ("&amp;", "&"),
];

/// Compiled regex for whitespace normalization
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extract the visible text of an HTML fragment
///
/// # Examples
///
/// ```
/// use tekst_core::utils::html_text;
///
/// assert_eq!(html_text("<p>Hello <b>World</b></p>"), "Hello World");
/// assert_eq!(html_text("<p>one</p><p>two</p>"), "one two");
/// ```
pub fn html_text(html: &str) -> String {
    let mut result = html.to_string();

    for (pattern, replacement) in HTML_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    for (entity, decoded) in ENTITIES {
        result = result.replace(entity, decoded);
    }

    result = WHITESPACE_RE.replace_all(&result, " ").to_string();
    result.trim().to_string()
}
