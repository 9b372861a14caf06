//! newsdesk: fetch news feeds, de-duplicate articles by link and keep a
//! crash-safe on-disk cache.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ FeedEntry ┌──────────────┐ Article ┌──────────────┐
//! │  source/   │ ────────► │  normalize/  │ ──────► │   cache.rs   │
//! │ collectors │           │ title + date │         │ (live list)  │
//! └────────────┘           └──────────────┘         └──────┬───────┘
//!       ▲  feed/ parses RSS, Atom, JSON Feed               │ save / load
//!       │                                           ┌──────▼───────┐
//! ┌─────┴──────┐  RefreshEvent (channel)            │   store.rs   │
//! │  refresh/  │ ─────────────────────► caller      │ (JSON files) │
//! │  (thread)  │                                    └──────────────┘
//! └────────────┘
//! ```
//!
//! * **`source`**: the [`Source`](source::Source) model, the
//!   [`SourceRegistry`](source::SourceRegistry) (saved between runs), and the
//!   [`Collector`](source::Collector) trait with its HTTP feed implementation.
//! * **`feed`**: format sniffing and parsing of feed documents.
//! * **`normalize`**: headline clean-up and date normalisation to UTC.
//! * **`article`**: the [`Article`](article::Article) record, keyed by link.
//! * **`cache`**: the shared in-memory list plus search.
//! * **`store`**: atomic batch files with quarantine for corrupted ones, plus
//!   the persisted read state.
//! * **`refresh`**: the background cycle that ties all of the above together.
//! * **`config`**: `newsdesk.toml` + `NEWSDESK_*` environment settings.

pub mod article;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod refresh;
pub mod source;
pub mod store;

pub use article::{Article, SearchField};
pub use cache::ArticleCache;
pub use config::AppConfig;
pub use refresh::{RefreshCoordinator, RefreshEvent, RefreshOutcome};
pub use source::{Collector, Source, SourceKind, SourceRegistry};
pub use store::{ArticleStore, ReadState};
