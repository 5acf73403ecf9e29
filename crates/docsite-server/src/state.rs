//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use docsite_site::{Resolver, TreeBuilder};

use crate::VersionInfo;
use crate::feedback::FeedbackSink;
use crate::rate_limit::RateLimiter;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    pub(crate) resolver: Arc<Resolver>,
    pub(crate) tree: Arc<TreeBuilder>,
    /// Configured versions, newest first.
    pub(crate) versions: Vec<VersionInfo>,
    pub(crate) default_version: Option<String>,
    /// Feedback rate limiter, keyed by client address.
    pub(crate) limiter: RateLimiter,
    pub(crate) feedback: Arc<dyn FeedbackSink>,
}

impl AppState {
    /// Whether `id` is a configured version.
    #[must_use]
    pub(crate) fn has_version(&self, id: &str) -> bool {
        self.versions.iter().any(|v| v.id == id)
    }
}
