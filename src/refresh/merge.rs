//! Link-keyed merging and source ordering.

use std::collections::HashMap;

use crate::article::Article;
use crate::source::Source;

/// Counts from one [`upsert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub replaced: usize,
}

/// Keep one article per link, the last one seen.  Articles with an empty
/// link are dropped.  Output order follows each link's first appearance.
pub fn dedup_by_link(articles: Vec<Article>) -> Vec<Article> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(articles.len());
    let mut out: Vec<Article> = Vec::with_capacity(articles.len());

    for article in articles {
        if article.link.is_empty() {
            continue;
        }
        match index.get(&article.link) {
            Some(&i) => out[i] = article,
            None => {
                index.insert(article.link.clone(), out.len());
                out.push(article);
            }
        }
    }
    out
}

/// Merge `fresh` into `existing` by link, then re-sort newest first.
///
/// An existing article with the same link is replaced in place; nothing is
/// ever removed.  Running the same batch twice leaves `existing` unchanged.
pub fn upsert(existing: &mut Vec<Article>, fresh: Vec<Article>) -> MergeStats {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, a)| (a.link.clone(), i))
        .collect();
    let mut stats = MergeStats::default();

    for article in fresh {
        if article.link.is_empty() {
            continue;
        }
        match index.get(&article.link) {
            Some(&i) => {
                existing[i] = article;
                stats.replaced += 1;
            }
            None => {
                index.insert(article.link.clone(), existing.len());
                existing.push(article);
                stats.added += 1;
            }
        }
    }

    // Stable, so equal timestamps keep their relative order.
    existing.sort();
    stats
}

/// Stable reorder putting sources whose kind is in `priority` first.
pub fn order_sources(mut sources: Vec<Source>, priority: &[String]) -> Vec<Source> {
    sources.sort_by_key(|s| !priority.iter().any(|p| p.eq_ignore_ascii_case(s.kind.as_str())));
    sources
}
