//! The live, in-memory article list.
//!
//! [`ArticleCache`] is a cheap-to-clone handle.  The refresh worker merges
//! into it while readers take snapshots; nobody holds the lock across I/O.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use crate::article::{Article, SearchField};
use crate::refresh::merge::{self, MergeStats};

#[derive(Debug, Clone, Default)]
pub struct ArticleCache {
    inner: Arc<RwLock<Vec<Article>>>,
}

impl ArticleCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer cannot leave the list half-merged (upsert only
    // assigns whole articles), so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Article>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Article>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every cached article, newest first.
    pub fn get_all_articles(&self) -> Vec<Article> {
        self.read().clone()
    }

    /// Articles in `category`; `""` or `"all"` returns everything.
    pub fn get_articles_by_category(&self, category: &str) -> Vec<Article> {
        let category = category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case("all") {
            return self.get_all_articles();
        }
        self.read()
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search.
    ///
    /// With `days` set, only articles published within that many days are
    /// returned and undated articles are left out.  An empty query matches
    /// everything (still subject to `days`).
    pub fn search(&self, query: &str, field: SearchField, days: Option<u32>) -> Vec<Article> {
        self.search_at(query, field, days, Utc::now())
    }

    fn search_at(
        &self,
        query: &str,
        field: SearchField,
        days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Vec<Article> {
        let needle = query.trim().to_lowercase();
        let cutoff = days.map(|d| now - Duration::days(i64::from(d)));

        self.read()
            .iter()
            .filter(|a| match cutoff {
                Some(cutoff) => a.publish_time.is_some_and(|t| t >= cutoff),
                None => true,
            })
            .filter(|a| needle.is_empty() || a.matches(&needle, field))
            .cloned()
            .collect()
    }

    /// Merge by link; see [`merge::upsert`].
    pub fn upsert(&self, fresh: Vec<Article>) -> MergeStats {
        merge::upsert(&mut self.write(), fresh)
    }

    /// Swap in a whole new list, sorted newest first.
    pub fn replace_all(&self, mut articles: Vec<Article>) {
        articles.sort();
        *self.write() = articles;
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::tests::make_article;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn seeded() -> ArticleCache {
        let mut recent = make_article("L1", "Rust 2.0 released", "tech");
        recent.publish_time = Some(now() - Duration::days(1));
        recent.summary = Some("The compiler got faster".into());

        let mut old = make_article("L2", "Rust history", "tech");
        old.publish_time = Some(now() - Duration::days(30));

        let undated = make_article("L3", "Rust undated", "world");

        let cache = ArticleCache::new();
        cache.replace_all(vec![undated, old, recent]);
        cache
    }

    #[test]
    fn replace_all_sorts_newest_first() {
        let links: Vec<_> = seeded().get_all_articles().into_iter().map(|a| a.link).collect();
        assert_eq!(links, ["L1", "L2", "L3"]);
    }

    #[test]
    fn filters_by_category() {
        let cache = seeded();
        assert_eq!(cache.get_articles_by_category("tech").len(), 2);
        assert_eq!(cache.get_articles_by_category("world").len(), 1);
        assert!(cache.get_articles_by_category("sport").is_empty());
        assert_eq!(cache.get_articles_by_category("all").len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_per_field() {
        let cache = seeded();
        assert_eq!(cache.search_at("RUST", SearchField::Title, None, now()).len(), 3);
        assert_eq!(cache.search_at("compiler", SearchField::Title, None, now()).len(), 0);
        assert_eq!(cache.search_at("compiler", SearchField::All, None, now()).len(), 1);
    }

    #[test]
    fn search_window_excludes_old_and_undated() {
        let cache = seeded();
        let hits = cache.search_at("rust", SearchField::All, Some(7), now());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link, "L1");
    }

    #[test]
    fn empty_query_returns_everything_in_window() {
        let cache = seeded();
        assert_eq!(cache.search_at("", SearchField::All, None, now()).len(), 3);
        assert_eq!(cache.search_at("  ", SearchField::All, Some(60), now()).len(), 2);
    }

    #[test]
    fn clones_share_state() {
        let cache = ArticleCache::new();
        let other = cache.clone();
        cache.upsert(vec![make_article("X", "x", "t")]);
        assert_eq!(other.len(), 1);
    }
}
