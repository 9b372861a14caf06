//! Background refresh cycles.
//!
//! A cycle runs on its own thread, walks the selected sources one at a time
//! and reports over an [`mpsc`] channel, the same way a UI thread would drain
//! any other background worker.
//!
//! ```text
//!   refresh_all_sources()          ┌──────────────┐   RefreshEvent
//!   refresh_by_category() ───────► │ worker thread│ ────────────────► receiver
//!                                  └──────┬───────┘
//!                    per source:          │
//!                    collect → normalise → upsert into ArticleCache
//!                    at the end:          │
//!                    dedup → upsert → ArticleStore::save → prune
//! ```
//!
//! ## Guarantees
//!
//! * At most one cycle runs at a time.  A second request while one is running
//!   is refused with a warning and returns `None`.
//! * The running flag is cleared by a drop guard, so even a panicking
//!   collector cannot leave the coordinator stuck.
//! * A failing source is logged, counted and skipped.  Its articles already
//!   in the cache stay there.
//! * Cancellation is checked before each source, and a cancel issued any time
//!   after a cycle was accepted reaches it.  A cancelled cycle keeps the
//!   articles it already merged in memory but writes no batch to disk.
//! * Source bookkeeping is saved to the registry file (if one is set) when a
//!   cycle ends and after every registry edit made through the coordinator.
//! * Merging never deletes: a category-scoped cycle leaves every other
//!   category's articles untouched.

pub mod events;
pub mod merge;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;

use crate::article::{Article, SearchField};
use crate::cache::ArticleCache;
use crate::error::SourceError;
use crate::source::{Collector, Source, SourceKind, SourceRegistry, SourceUpdate};
use crate::store::{ArticleStore, ReadState};

pub use events::{RefreshEvent, RefreshOutcome, RefreshScope, RefreshStatus, SourceFailure};
pub use merge::{dedup_by_link, order_sources, MergeStats};

/// Cooperative cancellation flag shared with a running cycle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Tunables for [`RefreshCoordinator`].
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Source kinds fetched before all others.
    pub priority_kinds: Vec<String>,
    /// Batches kept on disk after a save; `0` keeps everything.
    pub keep_batches: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            priority_kinds: vec!["pengpai".to_string()],
            keep_batches: 20,
        }
    }
}

/// Clears the running flag when the cycle ends, however it ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct RefreshCoordinator {
    registry: Arc<RwLock<SourceRegistry>>,
    cache: ArticleCache,
    store: ArticleStore,
    read_state: ReadState,
    registry_file: Option<PathBuf>,
    collectors: HashMap<String, Arc<dyn Collector>>,
    settings: RefreshSettings,
    running: AtomicBool,
    cancel: CancelToken,
    events: mpsc::Sender<RefreshEvent>,
}

impl RefreshCoordinator {
    /// Create a coordinator and the receiver its events arrive on.
    ///
    /// Register collectors with [`register`](Self::register) before sharing
    /// it behind an [`Arc`].
    pub fn new(
        registry: SourceRegistry,
        store: ArticleStore,
        settings: RefreshSettings,
    ) -> (Self, mpsc::Receiver<RefreshEvent>) {
        let (tx, rx) = mpsc::channel();
        let coordinator = Self {
            registry: Arc::new(RwLock::new(registry)),
            cache: ArticleCache::new(),
            read_state: ReadState::open(store.dir()),
            registry_file: None,
            store,
            collectors: HashMap::new(),
            settings,
            running: AtomicBool::new(false),
            cancel: CancelToken::default(),
            events: tx,
        };
        (coordinator, rx)
    }

    /// Use `collector` for every source of `kind`.
    pub fn register(&mut self, kind: impl Into<SourceKind>, collector: Arc<dyn Collector>) {
        let kind: SourceKind = kind.into();
        tracing::debug!(kind = %kind, collector = collector.name(), "Registered collector");
        self.collectors.insert(kind.as_str().to_string(), collector);
    }

    /// Save the registry to `path` after each cycle and each edit.
    pub fn persist_registry_to(&mut self, path: impl Into<PathBuf>) {
        self.registry_file = Some(path.into());
    }

    pub fn registry(&self) -> &Arc<RwLock<SourceRegistry>> {
        &self.registry
    }

    pub fn cache(&self) -> &ArticleCache {
        &self.cache
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, SourceRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, SourceRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Startup
    // -----------------------------------------------------------------------

    /// Fill the cache from the newest saved batch.
    ///
    /// Each article's category is re-derived from its source's current
    /// category, so a source moved between categories takes its old
    /// articles along.  Returns the number of articles loaded.
    pub fn load_from_store(&self) -> usize {
        let mut articles = self.store.load(None);
        {
            let registry = self.read_registry();
            for article in &mut articles {
                if let Some(category) = registry.category_of(&article.source_name) {
                    if article.category != category {
                        article.category = category.to_string();
                    }
                }
            }
        }
        let articles = dedup_by_link(articles);
        let count = articles.len();
        self.cache.replace_all(articles);
        tracing::info!(count, "Restored articles from disk");
        count
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get_all_articles(&self) -> Vec<Article> {
        self.cache.get_all_articles()
    }

    pub fn get_articles_by_category(&self, category: &str) -> Vec<Article> {
        self.cache.get_articles_by_category(category)
    }

    pub fn search(&self, query: &str, field: SearchField, days: Option<u32>) -> Vec<Article> {
        self.cache.search(query, field, days)
    }

    // -----------------------------------------------------------------------
    // Read state
    // -----------------------------------------------------------------------

    pub fn is_read(&self, link: &str) -> bool {
        self.read_state.is_read(link)
    }

    pub fn mark_read(&self, link: &str) -> bool {
        self.read_state.mark_read(link)
    }

    pub fn mark_unread(&self, link: &str) -> bool {
        self.read_state.mark_unread(link)
    }

    /// Forget every read mark.  Returns how many were cleared.
    pub fn clear_read(&self) -> usize {
        self.read_state.clear()
    }

    // -----------------------------------------------------------------------
    // Source edits
    // -----------------------------------------------------------------------

    pub fn add_source(&self, source: Source) -> Result<(), SourceError> {
        self.edit_registry(|registry| registry.add(source))
    }

    pub fn update_source(&self, name: &str, update: SourceUpdate) -> Result<(), SourceError> {
        self.edit_registry(|registry| registry.update(name, update))
    }

    pub fn remove_source(&self, name: &str) -> Result<Source, SourceError> {
        self.edit_registry(|registry| registry.remove(name))
    }

    fn edit_registry<T>(
        &self,
        edit: impl FnOnce(&mut SourceRegistry) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        let value = edit(&mut self.write_registry())?;
        self.save_registry();
        Ok(value)
    }

    fn save_registry(&self) {
        let Some(path) = &self.registry_file else {
            return;
        };
        if let Err(e) = self.read_registry().save(path) {
            tracing::error!(path = %path.display(), error = %e, "Failed to save source registry");
        }
    }

    // -----------------------------------------------------------------------
    // Refresh control
    // -----------------------------------------------------------------------

    pub fn is_refreshing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the running cycle to stop before its next source.  No-op when
    /// idle.
    pub fn cancel(&self) {
        if self.is_refreshing() {
            tracing::info!("Cancelling refresh");
            self.cancel.cancel();
        } else {
            tracing::debug!("Cancel requested with no refresh running");
        }
    }

    /// Start a cycle over every enabled source.
    pub fn refresh_all_sources(self: &Arc<Self>) -> Option<JoinHandle<RefreshOutcome>> {
        self.spawn_cycle(RefreshScope::All)
    }

    /// Start a cycle over one category.  `""` or `"all"` means every source.
    pub fn refresh_by_category(self: &Arc<Self>, category: &str) -> Option<JoinHandle<RefreshOutcome>> {
        self.spawn_cycle(RefreshScope::from_category(category))
    }

    fn spawn_cycle(self: &Arc<Self>, scope: RefreshScope) -> Option<JoinHandle<RefreshOutcome>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(scope = %scope, "Refresh already in progress; request ignored");
            return None;
        }
        // Reset before the handle is returned: a cancel sent right after
        // this call must reach the cycle.
        self.cancel.reset();

        let this = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("refresh".to_string())
            .spawn(move || {
                let _guard = RunningGuard(&this.running);
                this.run_cycle(scope)
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start refresh thread");
                self.running.store(false, Ordering::SeqCst);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // The cycle itself
    // -----------------------------------------------------------------------

    fn emit(&self, event: RefreshEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn run_cycle(&self, scope: RefreshScope) -> RefreshOutcome {
        let sources: Vec<Source> = {
            let registry = self.read_registry();
            let selected = registry.enabled().filter(|s| scope.includes(s)).cloned().collect();
            order_sources(selected, &self.settings.priority_kinds)
        };
        let total = sources.len();
        tracing::info!(scope = %scope, total, "Refresh started");
        self.emit(RefreshEvent::Started {
            scope: scope.clone(),
            total,
        });

        let mut outcome = RefreshOutcome::new(scope, total);
        let mut gathered: Vec<Article> = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            if self.cancel.is_cancelled() {
                outcome.status = RefreshStatus::Cancelled;
                break;
            }

            match self.collect_source(source) {
                Ok(articles) => {
                    self.write_registry().record_success(&source.name, Utc::now());
                    let stats = self.cache.upsert(articles.clone());
                    tracing::info!(
                        source = %source.name,
                        count = articles.len(),
                        added = stats.added,
                        replaced = stats.replaced,
                        "Source refreshed"
                    );
                    outcome.sources_succeeded += 1;
                    gathered.extend(articles);
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    tracing::warn!(source = %source.name, error = %message, "Source failed");
                    self.write_registry().record_failure(&source.name, &message);
                    self.emit(RefreshEvent::SourceFailed {
                        source: source.name.clone(),
                        error: message.clone(),
                    });
                    outcome.errors.push(SourceFailure {
                        source: source.name.clone(),
                        message,
                    });
                }
            }

            outcome.sources_processed = index + 1;
            self.emit(RefreshEvent::Progress {
                current: index + 1,
                total,
                source: source.name.clone(),
            });
        }

        if outcome.status == RefreshStatus::Cancelled {
            tracing::info!(
                processed = outcome.sources_processed,
                total,
                "Refresh cancelled; no batch written"
            );
            self.save_registry();
            self.emit(RefreshEvent::Cancelled(outcome.clone()));
            return outcome;
        }

        let unique = dedup_by_link(gathered);
        outcome.article_count = unique.len();
        self.cache.upsert(unique);

        if outcome.article_count > 0 {
            outcome.saved_to = self.store.save(&self.cache.get_all_articles(), None);
            if self.settings.keep_batches > 0 {
                self.store.prune(self.settings.keep_batches);
            }
        }
        self.save_registry();

        tracing::info!(
            articles = outcome.article_count,
            errors = outcome.errors.len(),
            "{}",
            outcome.message()
        );
        self.emit(RefreshEvent::Complete(outcome.clone()));
        outcome
    }

    /// Fetch one source and turn its entries into articles stamped with the
    /// source's current name and category.
    fn collect_source(&self, source: &Source) -> Result<Vec<Article>> {
        let collector = self
            .collectors
            .get(source.kind.as_str())
            .ok_or_else(|| anyhow!("no collector registered for kind `{}`", source.kind))?;

        let entries = collector
            .collect(source)
            .with_context(|| format!("{} collector", collector.name()))?;

        Ok(entries
            .into_iter()
            .filter_map(|mut entry| {
                entry.source_name = source.name.clone();
                entry.category = source.category.clone();
                Article::from_entry(entry)
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::feed::FeedEntry;

    /// Serves canned entries per source name; unknown names fail.
    struct FakeCollector {
        feeds: HashMap<String, Vec<(&'static str, &'static str)>>,
        /// Cancel this token once the named source has been collected.
        cancel_after: Option<(String, CancelToken)>,
        /// Block inside `collect` until a message arrives.
        gate: Option<Mutex<mpsc::Receiver<()>>>,
        /// Sleep this long inside every `collect`.
        delay: Option<Duration>,
    }

    impl FakeCollector {
        fn new(feeds: &[(&str, &[(&'static str, &'static str)])]) -> Self {
            Self {
                feeds: feeds
                    .iter()
                    .map(|(name, items)| (name.to_string(), items.to_vec()))
                    .collect(),
                cancel_after: None,
                gate: None,
                delay: None,
            }
        }
    }

    impl Collector for FakeCollector {
        fn name(&self) -> &str {
            "fake"
        }

        fn collect(&self, source: &Source) -> Result<Vec<FeedEntry>> {
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv_timeout(Duration::from_secs(5));
            }
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            let items = self
                .feeds
                .get(&source.name)
                .ok_or_else(|| anyhow!("connection refused"))?;
            if let Some((name, token)) = &self.cancel_after {
                if *name == source.name {
                    token.cancel();
                }
            }
            Ok(items
                .iter()
                .map(|(link, title)| FeedEntry {
                    title: title.to_string(),
                    link: link.to_string(),
                    content: None,
                    summary: None,
                    published: Some("2024-01-01T00:00:00Z".into()),
                    source_name: String::new(),
                    source_url: None,
                    category: String::new(),
                    collected_at: "2024-01-01 00:00:00".into(),
                })
                .collect())
        }
    }

    fn coordinator(
        sources: Vec<Source>,
        collector: FakeCollector,
    ) -> (tempfile::TempDir, Arc<RefreshCoordinator>, mpsc::Receiver<RefreshEvent>) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path()).unwrap();
        let (mut c, rx) = RefreshCoordinator::new(
            SourceRegistry::from_sources(sources),
            store,
            RefreshSettings::default(),
        );
        c.register(SourceKind::Rss, Arc::new(collector));
        (dir, Arc::new(c), rx)
    }

    #[test]
    fn failing_source_does_not_stop_the_cycle() {
        let sources = vec![
            Source::rss("A", "http://a", "tech"),
            Source::rss("B", "http://b", "tech"),
        ];
        let collector = FakeCollector::new(&[("A", &[("http://a/1", "A1"), ("http://a/2", "A2")])]);
        let (_dir, c, rx) = coordinator(sources, collector);

        let outcome = c.refresh_all_sources().unwrap().join().unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.article_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source, "B");
        assert!(outcome.message().contains("1 error(s)"));
        assert_eq!(c.get_all_articles().len(), 2);
        assert!(outcome.saved_to.is_some());

        let registry = c.registry().read().unwrap();
        assert_eq!(registry.get("A").unwrap().error_count, 0);
        assert!(registry.get("A").unwrap().last_update.is_some());
        assert_eq!(registry.get("B").unwrap().error_count, 1);
        drop(registry);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(RefreshEvent::Started { total: 2, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, RefreshEvent::SourceFailed { source, .. } if source == "B")));
        assert!(matches!(events.last(), Some(RefreshEvent::Complete(_))));
    }

    #[test]
    fn category_refresh_leaves_other_categories_alone() {
        let sources = vec![
            Source::rss("Tech", "http://t", "tech"),
            Source::rss("World", "http://w", "world"),
        ];
        let collector = FakeCollector::new(&[
            ("Tech", &[("L1", "Tech one (v2)"), ("L3", "Tech three")]),
            ("World", &[("L2", "World two")]),
        ]);
        let (_dir, c, _rx) = coordinator(sources, collector);
        let cached_world = Article {
            source_name: "World".into(),
            ..crate::article::tests::make_article("L2", "World two (cached)", "world")
        };
        c.cache().replace_all(vec![
            Article {
                source_name: "Tech".into(),
                ..crate::article::tests::make_article("L1", "Tech one", "tech")
            },
            cached_world.clone(),
        ]);

        let outcome = c.refresh_by_category("tech").unwrap().join().unwrap();
        assert_eq!(outcome.scope, RefreshScope::Category("tech".into()));
        assert_eq!(outcome.sources_total, 1);

        let all = c.get_all_articles();
        assert_eq!(all.len(), 3);
        let title_of = |link: &str| all.iter().find(|a| a.link == link).unwrap().title.clone();
        assert_eq!(title_of("L1"), "Tech one (v2)");
        assert_eq!(title_of("L2"), "World two (cached)");
        assert_eq!(title_of("L3"), "Tech three");

        let persisted = c.store().load(None);
        assert_eq!(persisted.len(), 3);
        let world = persisted.iter().find(|a| a.link == "L2").unwrap();
        assert_eq!(*world, cached_world);
        assert!(persisted.iter().any(|a| a.link == "L3"));
    }

    #[test]
    fn cancel_stops_before_next_source_and_skips_save() {
        let sources: Vec<_> = (1..=5)
            .map(|i| Source::rss(format!("S{i}"), format!("http://s{i}"), "tech"))
            .collect();
        let mut collector = FakeCollector::new(&[
            ("S1", &[("http://s1/1", "one")]),
            ("S2", &[("http://s2/1", "two")]),
            ("S3", &[("http://s3/1", "three")]),
            ("S4", &[]),
            ("S5", &[]),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let store = ArticleStore::open(dir.path()).unwrap();
        let (mut c, _rx) = RefreshCoordinator::new(
            SourceRegistry::from_sources(sources),
            store.clone(),
            RefreshSettings::default(),
        );
        collector.cancel_after = Some(("S2".into(), c.cancel_token()));
        c.register("rss", Arc::new(collector));
        let c = Arc::new(c);

        let outcome = c.refresh_all_sources().unwrap().join().unwrap();

        assert_eq!(outcome.status, RefreshStatus::Cancelled);
        assert_eq!(outcome.sources_processed, 2);
        assert!(outcome.saved_to.is_none());
        assert!(store.list_batches().is_empty());
        assert_eq!(c.get_all_articles().len(), 2);
        assert!(!c.is_refreshing());
    }

    #[test]
    fn cancel_right_after_start_is_not_lost() {
        let sources: Vec<_> = (1..=5)
            .map(|i| Source::rss(format!("S{i}"), format!("http://s{i}"), "tech"))
            .collect();
        let mut collector = FakeCollector::new(&[
            ("S1", &[("http://s1/1", "one")]),
            ("S2", &[("http://s2/1", "two")]),
            ("S3", &[("http://s3/1", "three")]),
            ("S4", &[("http://s4/1", "four")]),
            ("S5", &[("http://s5/1", "five")]),
        ]);
        collector.delay = Some(Duration::from_millis(50));
        let (_dir, c, _rx) = coordinator(sources, collector);

        for _ in 0..5 {
            let handle = c.refresh_all_sources().unwrap();
            c.cancel();
            let outcome = handle.join().unwrap();

            assert_eq!(outcome.status, RefreshStatus::Cancelled);
            assert!(outcome.sources_processed < 5);
            assert!(outcome.saved_to.is_none());
            assert!(c.store().list_batches().is_empty());
        }

        // The next cycle starts with a clean token.
        let outcome = c.refresh_all_sources().unwrap().join().unwrap();
        assert_eq!(outcome.status, RefreshStatus::Complete);
        assert_eq!(outcome.sources_processed, 5);
    }

    #[test]
    fn second_refresh_is_refused_while_running() {
        let (tx, gate) = mpsc::channel();
        let mut collector = FakeCollector::new(&[("A", &[("http://a/1", "A1")])]);
        collector.gate = Some(Mutex::new(gate));
        let (_dir, c, _rx) = coordinator(vec![Source::rss("A", "http://a", "tech")], collector);

        let first = c.refresh_all_sources().unwrap();
        assert!(c.is_refreshing());
        assert!(c.refresh_by_category("tech").is_none());

        tx.send(()).unwrap();
        first.join().unwrap();
        assert!(!c.is_refreshing());

        tx.send(()).unwrap();
        assert!(c.refresh_all_sources().unwrap().join().is_ok());
    }

    #[test]
    fn empty_scope_reports_nothing_fetched() {
        let (_dir, c, _rx) = coordinator(
            vec![Source::rss("A", "http://a", "tech")],
            FakeCollector::new(&[]),
        );
        let outcome = c.refresh_by_category("sport").unwrap().join().unwrap();
        assert_eq!(outcome.sources_total, 0);
        assert_eq!(outcome.message(), "Refresh complete: nothing fetched");
        assert!(outcome.saved_to.is_none());
    }

    #[test]
    fn unknown_kind_is_a_source_failure() {
        let (_dir, c, _rx) = coordinator(
            vec![Source::new("Paper", "pengpai", "china")],
            FakeCollector::new(&[]),
        );
        let outcome = c.refresh_all_sources().unwrap().join().unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("no collector"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn duplicate_links_across_sources_collapse() {
        let sources = vec![
            Source::rss("A", "http://a", "tech"),
            Source::rss("B", "http://b", "tech"),
        ];
        let collector = FakeCollector::new(&[
            ("A", &[("http://shared", "from A")]),
            ("B", &[("http://shared", "from B")]),
        ]);
        let (_dir, c, _rx) = coordinator(sources, collector);

        let outcome = c.refresh_all_sources().unwrap().join().unwrap();
        assert_eq!(outcome.article_count, 1);
        let all = c.get_all_articles();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].source_name, "B");
    }

    #[test]
    fn saved_batch_reloads_with_current_categories() {
        let sources = vec![Source::rss("A", "http://a", "tech")];
        let collector = FakeCollector::new(&[("A", &[("http://a/1", "A1")])]);
        let (dir, c, _rx) = coordinator(sources, collector);
        c.refresh_all_sources().unwrap().join().unwrap();

        let store = ArticleStore::open(dir.path()).unwrap();
        let moved = SourceRegistry::from_sources([Source::rss("A", "http://a", "science")]);
        let (fresh, _rx) = RefreshCoordinator::new(moved, store, RefreshSettings::default());

        assert_eq!(fresh.load_from_store(), 1);
        assert_eq!(fresh.get_articles_by_category("science").len(), 1);
        assert!(fresh.get_articles_by_category("tech").is_empty());
    }

    #[test]
    fn registry_is_saved_after_cycles_and_edits() {
        let sources = vec![
            Source::rss("A", "http://a", "tech"),
            Source::rss("B", "http://b", "tech"),
        ];
        let collector = FakeCollector::new(&[("A", &[("http://a/1", "A1")])]);
        let dir = tempfile::tempdir().unwrap();
        let registry_file = dir.path().join("sources.json");
        let (mut c, _rx) = RefreshCoordinator::new(
            SourceRegistry::from_sources(sources),
            ArticleStore::open(dir.path().join("news")).unwrap(),
            RefreshSettings::default(),
        );
        c.register(SourceKind::Rss, Arc::new(collector));
        c.persist_registry_to(&registry_file);
        let c = Arc::new(c);

        c.refresh_all_sources().unwrap().join().unwrap();
        let saved = SourceRegistry::restore(&registry_file, []);
        assert!(saved.get("A").unwrap().last_update.is_some());
        assert_eq!(saved.get("B").unwrap().error_count, 1);

        let mut mine = Source::rss("Mine", "http://mine", "personal");
        mine.is_user_added = true;
        c.add_source(mine).unwrap();
        c.remove_source("B").unwrap();
        c.update_source(
            "A",
            SourceUpdate {
                category: Some("science".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(c.add_source(Source::rss("Mine", "http://other", "x")).is_err());

        let saved = SourceRegistry::restore(&registry_file, []);
        assert_eq!(saved.len(), 2);
        assert!(saved.get("Mine").unwrap().is_user_added);
        assert!(saved.get("B").is_none());
        assert_eq!(saved.category_of("A"), Some("science"));
    }

    #[test]
    fn read_state_is_shared_through_the_coordinator() {
        let (dir, c, _rx) = coordinator(vec![], FakeCollector::new(&[]));
        assert!(c.mark_read("http://x/1"));
        assert!(c.mark_read("http://x/2"));
        assert!(c.is_read("http://x/1"));
        assert!(c.mark_unread("http://x/1"));
        assert!(!c.is_read("http://x/1"));

        let (reopened, _rx) = RefreshCoordinator::new(
            SourceRegistry::new(),
            ArticleStore::open(dir.path()).unwrap(),
            RefreshSettings::default(),
        );
        assert!(reopened.is_read("http://x/2"));
        assert_eq!(reopened.clear_read(), 1);
        assert!(!reopened.is_read("http://x/2"));
    }
}
