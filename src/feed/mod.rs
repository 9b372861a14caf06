//! Feed document parsing.
//!
//! [`parse_feed`] takes the raw bytes of one feed plus the [`Source`] that
//! produced it and returns one [`FeedEntry`] per usable item.  The format is
//! sniffed from the document itself:
//!
//! | document starts with      | format    | parser                |
//! |---------------------------|-----------|-----------------------|
//! | `<rss>` / `<rdf:RDF>`     | RSS       | [`rss`] crate         |
//! | `<feed>` (any prefix)     | Atom      | [`atom_syndication`]  |
//! | `{`                       | JSON Feed | `serde_json`          |
//!
//! Entries without a title or link are dropped quietly.  A document that
//! cannot be read at all is an error; the caller decides what that means for
//! the source.
//!
//! Dates are passed through as raw text.  Turning them into timestamps is the
//! job of [`crate::normalize::date`].

mod atom;
mod html;
mod json;
mod rss;

use chrono::Local;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::normalize::clean_title;
use crate::source::Source;

pub use html::{contains_html, strip_html};

/// Longest summary derived from a full-content body.
const SUMMARY_MAX_CHARS: usize = 300;

/// One entry of a feed, before date normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Full body; may contain HTML.
    pub content: Option<String>,
    /// Plain-text teaser.
    pub summary: Option<String>,
    /// Publication date exactly as the feed wrote it.
    pub published: Option<String>,
    pub source_name: String,
    pub source_url: Option<String>,
    pub category: String,
    pub collected_at: String,
}

/// The document flavours we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
    JsonFeed,
}

/// Why a single entry was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    MissingTitle,
    MissingLink,
}

/// Source-level fields copied onto every entry of one document.
pub(crate) struct EntryStamp {
    source_name: String,
    source_url: Option<String>,
    category: String,
    collected_at: String,
}

impl EntryStamp {
    fn new(source: &Source) -> Self {
        Self {
            source_name: source.name.clone(),
            source_url: source.url.clone(),
            category: source.category.clone(),
            collected_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Build an entry from raw parts, applying the shared title and link
    /// rules.
    fn entry(
        &self,
        raw_title: Option<&str>,
        link: Option<&str>,
        body: (Option<String>, Option<String>),
        published: Option<String>,
    ) -> Result<FeedEntry, Skip> {
        let raw_title = raw_title.map(str::trim).unwrap_or_default();
        if raw_title.is_empty() {
            return Err(Skip::MissingTitle);
        }
        let link = link
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(Skip::MissingLink)?;

        let (content, summary) = body;
        Ok(FeedEntry {
            title: clean_title(raw_title),
            link: link.to_string(),
            content,
            summary,
            published: published
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            source_name: self.source_name.clone(),
            source_url: self.source_url.clone(),
            category: self.category.clone(),
            collected_at: self.collected_at.clone(),
        })
    }
}

/// Pick `content` and `summary` from a full-content field and a
/// description-like field.
///
/// With full content, the description is stripped into the summary (or the
/// content is, truncated, if there is no description).  Without it, the
/// description doubles as content when it carries HTML.
pub(crate) fn resolve_body(
    full: Option<&str>,
    description: Option<&str>,
) -> (Option<String>, Option<String>) {
    let full = full.map(str::trim).filter(|s| !s.is_empty());
    let description = description.map(str::trim).filter(|s| !s.is_empty());

    match (full, description) {
        (Some(full), desc) => {
            let summary = match desc {
                Some(desc) => strip_html(desc),
                None => truncate_chars(&strip_html(full), SUMMARY_MAX_CHARS),
            };
            (Some(full.to_string()), non_empty(summary))
        }
        (None, Some(desc)) => {
            let content = contains_html(desc).then(|| desc.to_string());
            (content, non_empty(strip_html(desc)))
        }
        (None, None) => (None, None),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

/// Work out which parser a document needs.
pub fn detect_format(bytes: &[u8]) -> Result<FeedFormat, FeedError> {
    let body = trim_leading(bytes);
    if body.first() == Some(&b'{') {
        return Ok(FeedFormat::JsonFeed);
    }

    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                let root = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                return match root.as_str() {
                    "rss" | "RDF" => Ok(FeedFormat::Rss),
                    name if name.ends_with("feed") => Ok(FeedFormat::Atom),
                    _ => Err(FeedError::UnknownFormat(root)),
                };
            }
            Event::Eof => return Err(FeedError::UnknownFormat(String::new())),
            _ => {}
        }
        buf.clear();
    }
}

/// Skip a UTF-8 byte-order mark and leading whitespace.
fn trim_leading(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Parse one feed document into entries stamped with `source`'s identity.
pub fn parse_feed(bytes: &[u8], source: &Source) -> Result<Vec<FeedEntry>, FeedError> {
    let body = trim_leading(bytes);
    let format = detect_format(body)?;
    let stamp = EntryStamp::new(source);

    let entries = match format {
        FeedFormat::Rss => rss::parse(body, &stamp)?,
        FeedFormat::Atom => atom::parse(body, &stamp)?,
        FeedFormat::JsonFeed => json::parse(body, &stamp)?,
    };

    tracing::debug!(
        source = %source.name,
        format = ?format,
        count = entries.len(),
        "Parsed feed document"
    );
    Ok(entries)
}

/// Log and drop skipped entries, keeping the rest in document order.
pub(crate) fn keep_valid<I>(source: &str, results: I) -> Vec<FeedEntry>
where
    I: IntoIterator<Item = Result<FeedEntry, Skip>>,
{
    results
        .into_iter()
        .enumerate()
        .filter_map(|(index, result)| match result {
            Ok(entry) => Some(entry),
            Err(reason) => {
                tracing::debug!(source, index, ?reason, "Skipping feed entry");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
