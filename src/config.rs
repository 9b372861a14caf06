//! Runtime configuration.
//!
//! Read from an optional `newsdesk.toml` in the working directory, then
//! overridden by `NEWSDESK_*` environment variables (`NEWSDESK_DATA_DIR`,
//! `NEWSDESK_FETCH_TIMEOUT_SECS`, ...).  Every field has a default, so no
//! file at all is a valid setup.
//!
//! ```toml
//! data_dir = "data"
//! fetch_timeout_secs = 15
//! priority_kinds = ["pengpai"]
//!
//! [[sources]]
//! name = "BBC中文网"
//! url = "https://rsshub.app/bbc/zhongwen/simp"
//! category = "general"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::refresh::RefreshSettings;
use crate::source::{FetchOptions, Source, DESKTOP_USER_AGENT};

const CONFIG_NAME: &str = "newsdesk";
const ENV_PREFIX: &str = "NEWSDESK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root for everything written to disk.  Batches and read state go in
    /// `<data_dir>/news`, the source registry in `<data_dir>/sources.json`.
    pub data_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
    pub priority_kinds: Vec<String>,
    /// Batches to keep after each save; `0` keeps all of them.
    pub keep_batches: usize,
    /// Configured sources.  Empty means use [`default_sources`].
    pub sources: Vec<Source>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let refresh = RefreshSettings::default();
        Self {
            data_dir: PathBuf::from("data"),
            fetch_timeout_secs: 15,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            priority_kinds: refresh.priority_kinds,
            keep_batches: refresh.keep_batches,
            sources: Vec::new(),
        }
    }
}

impl AppConfig {
    /// `newsdesk.{toml,json,yaml,...}` from the working directory plus the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(CONFIG_NAME).required(false))
    }

    /// A specific config file plus the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(File::from(path.as_ref()))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn news_dir(&self) -> PathBuf {
        self.data_dir.join("news")
    }

    /// Where the source registry is saved between runs.
    pub fn sources_file(&self) -> PathBuf {
        self.data_dir.join("sources.json")
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            priority_kinds: self.priority_kinds.clone(),
            keep_batches: self.keep_batches,
        }
    }

    /// The configured sources, or the built-in list if none are configured.
    pub fn sources_or_default(&self) -> Vec<Source> {
        if self.sources.is_empty() {
            default_sources()
        } else {
            self.sources.clone()
        }
    }
}

/// Feeds used when the config names none.
pub fn default_sources() -> Vec<Source> {
    [
        ("BBC中文网", "https://rsshub.app/bbc/zhongwen/simp", "general"),
        ("界面新闻", "https://rsshub.app/jmdian/topic/119", "general"),
        ("第一财经", "https://rsshub.app/yicai/brief", "business"),
        ("南方周末", "https://rsshub.app/infzm/", "general"),
        ("新华社新闻", "https://rsshub.app/xinhua/whxw", "general"),
        ("央视新闻", "https://rsshub.app/cctv/news", "general"),
        ("BBC News", "https://feeds.bbci.co.uk/news/world/rss.xml", "international"),
        ("Hacker News", "https://hnrss.org/frontpage", "technology"),
        ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/index", "technology"),
        ("Nature", "https://www.nature.com/nature.rss", "science"),
    ]
    .into_iter()
    .map(|(name, url, category)| Source::rss(name, url, category))
    .collect()
}
