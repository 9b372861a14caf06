//! What a refresh cycle reports while it runs and when it ends.

use std::fmt;
use std::path::PathBuf;

use crate::source::Source;

/// Which sources a cycle covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshScope {
    All,
    Category(String),
}

impl RefreshScope {
    /// `""` and `"all"` (any case) mean every source.
    pub fn from_category(category: &str) -> Self {
        let category = category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case("all") {
            RefreshScope::All
        } else {
            RefreshScope::Category(category.to_string())
        }
    }

    pub fn includes(&self, source: &Source) -> bool {
        match self {
            RefreshScope::All => true,
            RefreshScope::Category(c) => source.category == *c,
        }
    }
}

impl fmt::Display for RefreshScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshScope::All => f.write_str("all"),
            RefreshScope::Category(c) => f.write_str(c),
        }
    }
}

/// Messages sent from the refresh worker to whoever holds the receiver.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Started { scope: RefreshScope, total: usize },
    /// Sent after each source, successful or not.
    Progress { current: usize, total: usize, source: String },
    SourceFailed { source: String, error: String },
    Complete(RefreshOutcome),
    Cancelled(RefreshOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub message: String,
}

/// Summary of one cycle.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub scope: RefreshScope,
    pub status: RefreshStatus,
    pub sources_total: usize,
    pub sources_processed: usize,
    pub sources_succeeded: usize,
    /// Unique articles gathered this cycle.
    pub article_count: usize,
    pub errors: Vec<SourceFailure>,
    /// Batch written at the end of the cycle, if any.
    pub saved_to: Option<PathBuf>,
}

impl RefreshOutcome {
    pub(crate) fn new(scope: RefreshScope, total: usize) -> Self {
        Self {
            scope,
            status: RefreshStatus::Complete,
            sources_total: total,
            sources_processed: 0,
            sources_succeeded: 0,
            article_count: 0,
            errors: Vec::new(),
            saved_to: None,
        }
    }

    /// A finished cycle counts as a success unless every attempted source
    /// failed.
    pub fn is_success(&self) -> bool {
        self.status == RefreshStatus::Complete
            && (self.sources_succeeded > 0 || self.errors.is_empty())
    }

    /// One-line, user-facing summary.  Ends in `(not saved)` when articles
    /// were fetched but the batch could not be written.
    pub fn message(&self) -> String {
        let message = self.summary_line();
        if self.status == RefreshStatus::Complete && self.article_count > 0 && self.saved_to.is_none() {
            format!("{message} (not saved)")
        } else {
            message
        }
    }

    fn summary_line(&self) -> String {
        match self.status {
            RefreshStatus::Cancelled => format!(
                "Refresh cancelled after {} of {} sources",
                self.sources_processed, self.sources_total
            ),
            RefreshStatus::Complete if self.article_count == 0 && self.errors.is_empty() => {
                "Refresh complete: nothing fetched".to_string()
            }
            RefreshStatus::Complete if self.errors.is_empty() => format!(
                "Refresh complete: {} articles from {} sources",
                self.article_count, self.sources_succeeded
            ),
            RefreshStatus::Complete => format!(
                "Refresh complete with {} error(s): {} articles from {} sources",
                self.errors.len(),
                self.article_count,
                self.sources_succeeded
            ),
        }
    }

    /// Per-source failure lines, if there were any.
    pub fn error_report(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|f| format!("{}: {}", f.source, f.message))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
