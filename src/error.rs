//! Error types for the library half of the crate.
//!
//! Each layer gets its own enum so callers can tell a network failure from a
//! malformed feed or a storage problem.  The binary and the collector seam use
//! [`anyhow`] on top of these.

use thiserror::Error;

/// Failure fetching or parsing one feed document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to parse RSS feed: {0}")]
    Rss(#[from] rss::Error),

    #[error("failed to parse Atom feed: {0}")]
    Atom(#[from] atom_syndication::Error),

    #[error("failed to parse JSON feed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognised feed document (root element `{0}`)")]
    UnknownFormat(String),

    #[error("source `{0}` has no URL configured")]
    MissingUrl(String),
}

/// Failure reading or writing a batch file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected change to the source registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("a source named `{0}` already exists")]
    DuplicateName(String),

    #[error("URL `{0}` is already used by another source")]
    DuplicateUrl(String),

    #[error("RSS source `{0}` needs a URL")]
    MissingUrl(String),

    #[error("source name must not be empty")]
    EmptyName,

    #[error("no source named `{0}`")]
    NotFound(String),
}
