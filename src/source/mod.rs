//! News sources and the collectors that fetch them.
//!
//! A [`Source`] is configuration: where to fetch, what category its articles
//! belong to, and some bookkeeping about recent failures.  A [`Collector`]
//! knows how to fetch one *kind* of source.  The refresh coordinator picks
//! the collector by [`Source::kind`].
//!
//! ## For contributors: adding a new source kind
//!
//! 1. Create a new file in this directory (e.g. `pengpai.rs`).
//! 2. Define a struct and implement [`Collector`] for it; `collect()` returns
//!    [`FeedEntry`] values, dates left as raw text.
//! 3. Re-export it below and register it with
//!    [`RefreshCoordinator::register`](crate::refresh::RefreshCoordinator::register)
//!    under the kind string your sources use.
//!
//! Merging, date normalisation and persistence are all kind-agnostic.

mod http;
mod registry;
mod rss;

pub use http::{FetchOptions, HttpFetcher, DESKTOP_USER_AGENT};
pub use registry::{SourceRegistry, SourceUpdate};
pub use rss::{RssCollector, SourceStatus};

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::UNCATEGORIZED;
use crate::feed::FeedEntry;

/// Something that can fetch entries for sources of one kind.
///
/// Collectors run on the refresh worker thread, so they must be
/// [`Send`] + [`Sync`].
///
/// ```ignore
/// pub struct MyCollector { /* clients, keys */ }
///
/// impl Collector for MyCollector {
///     fn name(&self) -> &str { "my-site" }
///
///     fn collect(&self, source: &Source) -> Result<Vec<FeedEntry>> {
///         // Fetch, then convert into FeedEntry values.
///         todo!()
///     }
/// }
/// ```
pub trait Collector: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Fetch everything currently offered by `source`.
    ///
    /// An error means the whole source failed this cycle; the coordinator
    /// records it and moves on to the next source.
    fn collect(&self, source: &Source) -> Result<Vec<FeedEntry>>;
}

/// How a source is fetched.
///
/// Stored as a plain lower-case string so config files and saved registries
/// can name kinds this build has no collector for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    #[default]
    Rss,
    Other(String),
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Rss => "rss",
            SourceKind::Other(kind) => kind.as_str(),
        }
    }
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        let kind = s.trim().to_ascii_lowercase();
        if kind == "rss" || kind.is_empty() {
            SourceKind::Rss
        } else {
            SourceKind::Other(kind)
        }
    }
}

impl From<&str> for SourceKind {
    fn from(s: &str) -> Self {
        SourceKind::from(s.to_string())
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique, human-readable name.
    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: SourceKind,

    /// Feed URL.  Required for RSS sources; scraper kinds may not need one.
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub is_user_added: bool,

    /// Last time a fetch succeeded.
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,

    /// Consecutive failures since the last success.
    #[serde(default)]
    pub error_count: u32,

    #[serde(default)]
    pub last_error: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

fn default_enabled() -> bool {
    true
}

impl Source {
    pub fn new(name: impl Into<String>, kind: impl Into<SourceKind>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: None,
            category: category.into(),
            enabled: true,
            is_user_added: false,
            last_update: None,
            error_count: 0,
            last_error: None,
            notes: None,
        }
    }

    /// Shorthand for an RSS/Atom/JSON feed source.
    pub fn rss(name: impl Into<String>, url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(name, SourceKind::Rss, category)
        }
    }

    /// The URL, if one is set and non-blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// A display name for a URL: its host, or the URL itself if it does not
/// parse.
pub fn name_from_url(url: &str) -> String {
    reqwest::Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.trim().to_string())
}
