//! The article record shared by the parser, the cache and the store.
//!
//! Every collector turns its native format into [`FeedEntry`] values, and the
//! refresh coordinator converts those into `Article`s once dates have been
//! normalised.  From then on an article is identified by its `link`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::FeedEntry;
use crate::normalize::date::{self, DateInput};

/// Category assigned to articles whose source has none.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A single news item, normalised from any source.
///
/// ## Sorting
///
/// `Article` implements [`Ord`] for **reverse-chronological** ordering:
/// newer items sort before older ones, and items without a date sort last.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Cleaned headline.
    #[serde(default)]
    pub title: String,

    /// URL of the full story.  This is the de-duplication key.
    #[serde(default)]
    pub link: String,

    /// Full body, may still contain HTML.
    #[serde(default)]
    pub content: Option<String>,

    /// Plain-text teaser.
    #[serde(default)]
    pub summary: Option<String>,

    /// Publication time in UTC.
    ///
    /// Older batch files may hold naive or RFC 2822 strings here, so loading
    /// goes through the date normaliser instead of a strict RFC 3339 parse.
    #[serde(default, deserialize_with = "date::deserialize_lenient")]
    pub publish_time: Option<DateTime<Utc>>,

    /// Name of the source this came from.
    #[serde(default)]
    pub source_name: String,

    /// Category of the owning source at the time of collection.
    #[serde(default = "default_category")]
    pub category: String,

    /// Local wall-clock time the entry was collected, `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub collected_at: String,
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

impl Article {
    /// Convert a parsed feed entry, normalising its date.
    ///
    /// Returns `None` for entries without a link; they can never be
    /// de-duplicated and are dropped.
    pub fn from_entry(entry: FeedEntry) -> Option<Self> {
        let link = entry.link.trim().to_string();
        if link.is_empty() {
            tracing::warn!(title = %entry.title, source = %entry.source_name, "Dropping entry without link");
            return None;
        }

        let publish_time = date::normalize(DateInput::from(entry.published.as_deref()));
        if publish_time.is_none() {
            if let Some(raw) = entry.published.as_deref() {
                tracing::debug!(raw, link = %link, "Unparseable publish date");
            }
        }

        Some(Self {
            title: entry.title,
            link,
            content: entry.content,
            summary: entry.summary,
            publish_time,
            source_name: entry.source_name,
            category: entry.category,
            collected_at: entry.collected_at,
        })
    }

    /// Case-insensitive substring match against one field (or all of them).
    ///
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str, field: SearchField) -> bool {
        let hit = |text: Option<&str>| {
            text.map(|t| t.to_lowercase().contains(needle))
                .unwrap_or(false)
        };
        match field {
            SearchField::Title => hit(Some(&self.title)),
            SearchField::Summary => hit(self.summary.as_deref()),
            SearchField::Content => hit(self.content.as_deref()),
            SearchField::All => {
                hit(Some(&self.title))
                    || hit(self.summary.as_deref())
                    || hit(self.content.as_deref())
            }
        }
    }
}

/// Which text field a search looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Summary,
    Content,
    #[default]
    All,
}

// ---------------------------------------------------------------------------
// Ordering: reverse chronological (newest first)
// ---------------------------------------------------------------------------

impl Ord for Article {
    fn cmp(&self, other: &Self) -> Ordering {
        // `other` first so that `Some(newer) > Some(older)` gives us newest-first.
        // `None` is less than `Some(_)`, so undated items sink to the bottom.
        other.publish_time.cmp(&self.publish_time)
    }
}

impl PartialOrd for Article {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
