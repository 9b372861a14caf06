//! Atom 1.0 documents via [`atom_syndication`].

use atom_syndication::{Entry, Feed};

use super::{keep_valid, resolve_body, EntryStamp, FeedEntry, Skip};
use crate::error::FeedError;

pub(super) fn parse(bytes: &[u8], stamp: &EntryStamp) -> Result<Vec<FeedEntry>, FeedError> {
    let feed = Feed::read_from(bytes)?;
    Ok(keep_valid(
        &stamp.source_name,
        feed.entries().iter().map(|entry| convert_entry(entry, stamp)),
    ))
}

fn convert_entry(entry: &Entry, stamp: &EntryStamp) -> Result<FeedEntry, Skip> {
    // Prefer the alternate link; fall back to whatever link comes first.
    let link = entry
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| entry.links().first())
        .map(|l| l.href());

    let content = entry.content().and_then(|c| c.value());
    let summary = entry.summary().map(|s| s.value.as_str());

    // `updated` is mandatory in Atom, so the parser fills in the epoch when a
    // feed leaves it out.
    let published = entry
        .published()
        .or_else(|| Some(entry.updated()).filter(|u| u.timestamp() != 0))
        .map(|dt| dt.to_rfc3339());

    stamp.entry(
        Some(entry.title().value.as_str()),
        link,
        resolve_body(content, summary),
        published,
    )
}
