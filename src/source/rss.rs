//! The feed collector: fetch a URL over HTTP and hand the bytes to
//! [`parse_feed`].
//!
//! Despite the name it handles every document [`parse_feed`] understands, so
//! Atom and JSON Feed URLs can be configured as `rss` sources too.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use super::{Collector, HttpFetcher, Source};
use crate::error::FeedError;
use crate::feed::{parse_feed, FeedEntry};

/// Fetches and parses feed documents.
pub struct RssCollector {
    fetcher: HttpFetcher,
}

/// Result of probing a single source.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub source_name: String,
    pub ok: bool,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl RssCollector {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }

    fn fetch_entries(&self, source: &Source) -> Result<Vec<FeedEntry>, FeedError> {
        let url = source
            .url()
            .ok_or_else(|| FeedError::MissingUrl(source.name.clone()))?;
        let body = self.fetcher.get(url)?;
        parse_feed(&body, source)
    }

    /// Fetch and parse `source` once without keeping the result.
    ///
    /// Useful after adding a source to check that it actually serves a feed.
    pub fn check_status(&self, source: &Source) -> SourceStatus {
        let result = self.fetch_entries(source);
        if let Err(e) = &result {
            tracing::info!(source = %source.name, error = %e, "Source check failed");
        }
        SourceStatus {
            source_name: source.name.clone(),
            ok: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            checked_at: Utc::now(),
        }
    }
}

impl Collector for RssCollector {
    fn name(&self) -> &str {
        "rss"
    }

    fn collect(&self, source: &Source) -> Result<Vec<FeedEntry>> {
        let entries = self
            .fetch_entries(source)
            .with_context(|| format!("collecting `{}`", source.name))?;
        tracing::info!(source = %source.name, count = entries.len(), "Collected feed");
        Ok(entries)
    }
}
