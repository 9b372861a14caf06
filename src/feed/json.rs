//! [JSON Feed](https://www.jsonfeed.org/version/1.1/) documents.
//!
//! Items are decoded one at a time so a single malformed item only costs
//! that item.

use serde::Deserialize;
use serde_json::Value;

use super::{resolve_body, EntryStamp, FeedEntry, Skip};
use crate::error::FeedError;

/// Length of the title synthesised for untitled items.
const SYNTHETIC_TITLE_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
struct Document {
    version: String,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Item {
    id: Option<Value>,
    title: Option<String>,
    url: Option<String>,
    external_url: Option<String>,
    content_html: Option<String>,
    content_text: Option<String>,
    summary: Option<String>,
    date_published: Option<String>,
    date_modified: Option<String>,
}

impl Item {
    /// `url`, then `external_url`, then an `id` that happens to be a URL.
    fn link(&self) -> Option<&str> {
        let id = self.id.as_ref().and_then(Value::as_str).filter(|id| {
            id.starts_with("http://") || id.starts_with("https://")
        });
        non_blank(self.url.as_deref())
            .or_else(|| non_blank(self.external_url.as_deref()))
            .or(id)
    }

    fn title(&self) -> Option<String> {
        if let Some(title) = non_blank(self.title.as_deref()) {
            return Some(title.to_string());
        }
        let text = non_blank(self.content_text.as_deref())
            .map(String::from)
            .or_else(|| self.content_html.as_deref().map(super::strip_html))?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(match text.char_indices().nth(SYNTHETIC_TITLE_CHARS) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

pub(super) fn parse(bytes: &[u8], stamp: &EntryStamp) -> Result<Vec<FeedEntry>, FeedError> {
    let doc: Document = serde_json::from_slice(bytes)?;
    if !doc.version.starts_with("https://jsonfeed.org/version/") {
        return Err(FeedError::UnknownFormat(format!("json feed version `{}`", doc.version)));
    }

    let mut entries = Vec::with_capacity(doc.items.len());
    for (index, raw) in doc.items.into_iter().enumerate() {
        let item: Item = match serde_json::from_value(raw) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(source = %stamp.source_name, index, error = %e, "Malformed JSON Feed item");
                continue;
            }
        };
        match convert_item(&item, stamp) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                tracing::debug!(source = %stamp.source_name, index, ?reason, "Skipping feed entry");
            }
        }
    }
    Ok(entries)
}

fn convert_item(item: &Item, stamp: &EntryStamp) -> Result<FeedEntry, Skip> {
    let full = non_blank(item.content_html.as_deref()).or(non_blank(item.content_text.as_deref()));
    let published = item
        .date_published
        .clone()
        .or_else(|| item.date_modified.clone());

    stamp.entry(
        item.title().as_deref(),
        item.link(),
        resolve_body(full, item.summary.as_deref()),
        published,
    )
}
