//! In-memory cache of rendered pages

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Rendered within the revalidation window
    Fresh(String),
    /// Older than the window; usable if a re-render fails
    Stale(String),
    Missing,
}

struct CachedPage {
    html: String,
    rendered_at: Instant,
}

/// Rendered pages keyed by request path
pub struct RenderCache {
    ttl: Duration,
    pages: RwLock<HashMap<String, CachedPage>>,
}

impl RenderCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: RwLock::new(HashMap::new()),
        }
    }

    pub fn lookup(&self, key: &str) -> Lookup {
        match self.pages.read().get(key) {
            Some(page) if page.rendered_at.elapsed() < self.ttl => Lookup::Fresh(page.html.clone()),
            Some(page) => Lookup::Stale(page.html.clone()),
            None => Lookup::Missing,
        }
    }

    pub fn store(&self, key: &str, html: String) {
        self.pages.write().insert(
            key.to_string(),
            CachedPage {
                html,
                rendered_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.pages.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.pages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
