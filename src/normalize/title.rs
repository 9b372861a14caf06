//! Headline clean-up.
//!
//! Aggregator feeds like to decorate titles with `[Source] date time:`
//! prefixes or `| Source Name` suffixes.  Stripping them keeps the same story
//! from looking different across feeds.  This is heuristic: it aims at the
//! common shapes, not at every possible decoration.

use std::sync::LazyLock;

use regex::Regex;

/// `[Source] Mon, 01 Jan 2024 12:00:00 GMT:` or `[Source] 2024-01-01 12:00 +0800 -`
static BRACKET_DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*\[[^\]]+\]\s+(?:\w{3},?\s+\d{1,2}\s+\w{3,}\s+\d{4}|\d{4}[-/]\d{1,2}[-/]\d{1,2})\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s+[+-]\d{4}|\s+GMT)?\s*[:—-]?\s*",
    )
    .unwrap()
});

static BRACKET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[.*?\]\s*").unwrap());

static PIPE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*[\w\s]+$").unwrap());

/// Outlets that prefix their own name to headlines.
const KNOWN_SOURCES: &[&str] = &["Sky Sports", "Fox Sports", "BBC News", "Reuters", "CNN", "ESPN"];

static KNOWN_SOURCE_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KNOWN_SOURCES
        .iter()
        .map(|name| Regex::new(&format!(r"(?i)^\s*{}\s*[:—-]\s*", regex::escape(name))).unwrap())
        .collect()
});

/// Remove source and date decorations from a headline.
///
/// Never returns an empty string for non-empty input: if the rules eat the
/// whole title, the trimmed original comes back instead.
///
/// Examples:
/// - `"[Feed] Mon, 01 Jan 2024 12:00:00 GMT: Big News"` -> `"Big News"`
/// - `"Markets rally | Reuters World"` -> `"Markets rally"`
/// - `"BBC News - Storm warning"` -> `"Storm warning"`
pub fn clean_title(raw: &str) -> String {
    let after_complex = BRACKET_DATE_PREFIX.replace(raw, "");
    // The simple bracket rule runs either way: on the original when the
    // compound prefix did not match, otherwise on whatever it left behind.
    let mut cleaned = BRACKET_PREFIX.replace(&after_complex, "").into_owned();

    cleaned = PIPE_SUFFIX.replace(&cleaned, "").into_owned();

    for pattern in KNOWN_SOURCE_PREFIXES.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        raw.trim().to_string()
    } else {
        trimmed.to_string()
    }
}
