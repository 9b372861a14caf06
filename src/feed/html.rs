//! Just enough HTML handling to turn feed bodies into plain-text teasers.

use std::sync::LazyLock;

use regex::Regex;

/// A tag or comment opener.  A bare `<` followed by a space or digit is text.
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:[a-zA-Z][a-zA-Z0-9]*|/[a-zA-Z][a-zA-Z0-9]*|!--)[^>]*>").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Whether the text carries anything that looks like markup.
pub fn contains_html(text: &str) -> bool {
    MARKUP.is_match(text)
}

/// Drop tags, decode the common entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut text = MARKUP.replace_all(html, " ").into_owned();
    // `&amp;` is last so `&amp;lt;` decodes to `&lt;`, not `<`.
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(
            strip_html("<p>Hello,\n  <b>world</b></p><br/>again"),
            "Hello, world again"
        );
    }

    #[test]
    fn plain_text_comparisons_survive() {
        assert_eq!(
            strip_html("Profit 3 < 5 and 7 > 2 today"),
            "Profit 3 < 5 and 7 > 2 today"
        );
        assert_eq!(strip_html("a<b>bold</b> <!-- note --> x"), "a bold x");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(strip_html("Fish &amp; chips&nbsp;&lt;3"), "Fish & chips <3");
        assert_eq!(strip_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn detects_markup() {
        assert!(contains_html("<p>x</p>"));
        assert!(contains_html("line<br/>break"));
        assert!(!contains_html("a < b and c > d"));
        assert!(!contains_html("plain"));
    }
}
