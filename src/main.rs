//! newsdesk: run one refresh cycle and print what came in.
//!
//! ```text
//! newsdesk              # every enabled source
//! newsdesk technology   # one category
//! ```
//!
//! Logging goes through `RUST_LOG` (default `info`).  Configuration is read
//! from `newsdesk.toml` and `NEWSDESK_*` variables; see [`AppConfig`].  After
//! the first run, sources come from `<data_dir>/sources.json`.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use newsdesk::refresh::RefreshScope;
use newsdesk::source::{HttpFetcher, RssCollector};
use newsdesk::{
    AppConfig, ArticleStore, RefreshCoordinator, RefreshEvent, SourceKind, SourceRegistry,
};

/// How many of the newest headlines to print at the end.
const HEADLINES_SHOWN: usize = 15;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();

    // -- parse arguments -----------------------------------------------------
    let category = std::env::args().nth(1).unwrap_or_default();

    // -- configuration and wiring --------------------------------------------
    let config = AppConfig::load().context("loading configuration")?;
    let store = ArticleStore::open(config.news_dir())
        .with_context(|| format!("opening {}", config.news_dir().display()))?;
    let registry = SourceRegistry::restore(&config.sources_file(), config.sources_or_default());
    let fetcher = HttpFetcher::new(&config.fetch_options())?;

    let (mut coordinator, rx) = RefreshCoordinator::new(registry, store, config.refresh_settings());
    coordinator.register(SourceKind::Rss, Arc::new(RssCollector::new(fetcher)));
    coordinator.persist_registry_to(config.sources_file());
    let coordinator = Arc::new(coordinator);

    coordinator.load_from_store();

    // -- run one cycle ---------------------------------------------------------
    let handle = coordinator
        .refresh_by_category(&category)
        .ok_or_else(|| anyhow!("a refresh is already running"))?;

    // Drain events until the worker is done.  The coordinator keeps its
    // sender alive, so the channel never disconnects on its own.
    let tick = Duration::from_millis(100);
    loop {
        match rx.recv_timeout(tick) {
            Ok(event) => report(&event),
            Err(RecvTimeoutError::Timeout) if handle.is_finished() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    rx.try_iter().for_each(|event| report(&event));

    let outcome = handle
        .join()
        .map_err(|_| anyhow!("refresh worker panicked"))?;

    // -- summary ---------------------------------------------------------------
    let articles = match &outcome.scope {
        RefreshScope::All => coordinator.get_all_articles(),
        RefreshScope::Category(c) => coordinator.get_articles_by_category(c),
    };
    for article in articles.iter().take(HEADLINES_SHOWN) {
        let when = article
            .publish_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "--".to_string());
        println!("{when:<18} {} [{}]", article.title, article.source_name);
    }
    println!("{}", outcome.message());
    if let Some(report) = outcome.error_report() {
        eprintln!("{report}");
    }

    Ok(())
}

fn report(event: &RefreshEvent) {
    match event {
        RefreshEvent::Started { scope, total } => {
            eprintln!("Refreshing {total} source(s) [{scope}]");
        }
        RefreshEvent::Progress {
            current,
            total,
            source,
        } => {
            eprintln!("  [{current}/{total}] {source}");
        }
        RefreshEvent::SourceFailed { source, error } => {
            eprintln!("  ! {source}: {error}");
        }
        // The final summary is printed from the join handle's outcome.
        RefreshEvent::Complete(_) | RefreshEvent::Cancelled(_) => {}
    }
}
