//! The set of configured sources.
//!
//! Names are unique, and so are URLs among sources that have one.  The
//! coordinator reads from the registry at the start of each cycle and writes
//! fetch outcomes back after each source.
//!
//! The whole registry, bookkeeping and user-added sources included, is saved
//! as a JSON array with [`SourceRegistry::save`] and read back with
//! [`SourceRegistry::restore`].

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::{name_from_url, Source, SourceKind};
use crate::error::{SourceError, StoreError};
use crate::store::{read_json, write_atomic};

/// Partial update for [`SourceRegistry::update`].  `None` leaves a field
/// alone.
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub enabled: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, logging and skipping sources that fail validation.
    pub fn from_sources(sources: impl IntoIterator<Item = Source>) -> Self {
        let mut registry = Self::new();
        for source in sources {
            let name = source.name.clone();
            if let Err(e) = registry.add(source) {
                tracing::warn!(source = %name, error = %e, "Skipping source");
            }
        }
        registry
    }

    /// Load the registry saved at `path`.  Without a readable file, start
    /// from `configured` instead.
    ///
    /// Once a registry has been saved it is the source of truth: configured
    /// sources only seed the first run, so removals stick.
    pub fn restore(path: &Path, configured: impl IntoIterator<Item = Source>) -> Self {
        if path.exists() {
            match read_json::<Vec<Source>>(path) {
                Ok(saved) => {
                    let registry = Self::from_sources(saved);
                    tracing::info!(path = %path.display(), count = registry.len(), "Restored source registry");
                    return registry;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Saved registry unreadable; using configured sources");
                }
            }
        }
        Self::from_sources(configured)
    }

    /// Write every source to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_atomic(path, &self.sources)?;
        tracing::debug!(path = %path.display(), count = self.sources.len(), "Saved source registry");
        Ok(())
    }

    /// Add a source.  An empty name is replaced by the URL's host.
    pub fn add(&mut self, mut source: Source) -> Result<(), SourceError> {
        source.name = source.name.trim().to_string();
        if source.name.is_empty() {
            source.name = source.url().map(name_from_url).ok_or(SourceError::EmptyName)?;
        }
        if source.kind == SourceKind::Rss && source.url().is_none() {
            return Err(SourceError::MissingUrl(source.name));
        }
        if self.get(&source.name).is_some() {
            return Err(SourceError::DuplicateName(source.name));
        }
        if let Some(url) = source.url() {
            if self.url_in_use(url, None) {
                return Err(SourceError::DuplicateUrl(url.to_string()));
            }
        }

        tracing::info!(source = %source.name, kind = %source.kind, category = %source.category, "Source added");
        self.sources.push(source);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Source, SourceError> {
        let idx = self.position(name)?;
        let removed = self.sources.remove(idx);
        tracing::info!(source = %removed.name, "Source removed");
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Source> {
        self.sources.iter_mut().find(|s| s.name == name)
    }

    /// Apply a partial update, checking a rename or new URL against the other
    /// sources first.
    pub fn update(&mut self, name: &str, update: SourceUpdate) -> Result<(), SourceError> {
        let idx = self.position(name)?;

        if let Some(new_name) = update.name.as_deref().map(str::trim) {
            if new_name.is_empty() {
                return Err(SourceError::EmptyName);
            }
            if new_name != name && self.get(new_name).is_some() {
                return Err(SourceError::DuplicateName(new_name.to_string()));
            }
        }
        if let Some(url) = update.url.as_deref().map(str::trim) {
            if url.is_empty() && self.sources[idx].kind == SourceKind::Rss {
                return Err(SourceError::MissingUrl(name.to_string()));
            }
            if !url.is_empty() && self.url_in_use(url, Some(idx)) {
                return Err(SourceError::DuplicateUrl(url.to_string()));
            }
        }

        let source = &mut self.sources[idx];
        if let Some(new_name) = update.name {
            source.name = new_name.trim().to_string();
        }
        if let Some(url) = update.url {
            let url = url.trim().to_string();
            source.url = (!url.is_empty()).then_some(url);
        }
        if let Some(category) = update.category {
            source.category = category;
        }
        if let Some(enabled) = update.enabled {
            source.enabled = enabled;
        }
        if let Some(notes) = update.notes {
            source.notes = Some(notes);
        }
        tracing::info!(source = %source.name, "Source updated");
        Ok(())
    }

    pub fn all(&self) -> &[Source] {
        &self.sources
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Enabled sources in `category`.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Source> {
        self.enabled().filter(move |s| s.category == category)
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Current category of the named source.
    pub fn category_of(&self, name: &str) -> Option<&str> {
        self.get(name).map(|s| s.category.as_str())
    }

    pub fn record_success(&mut self, name: &str, at: DateTime<Utc>) {
        if let Some(source) = self.get_mut(name) {
            source.last_update = Some(at);
            source.error_count = 0;
            source.last_error = None;
        }
    }

    pub fn record_failure(&mut self, name: &str, error: &str) {
        if let Some(source) = self.get_mut(name) {
            source.error_count = source.error_count.saturating_add(1);
            source.last_error = Some(error.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, SourceError> {
        self.sources
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn url_in_use(&self, url: &str, except: Option<usize>) -> bool {
        self.sources
            .iter()
            .enumerate()
            .any(|(i, s)| Some(i) != except && s.url() == Some(url))
    }
}
