//! Incremental post listing ("load more")
//!
//! The loader holds the posts shown so far and the cursor to the next page.
//! Each `load_more` follows the cursor and appends the new page. Only one
//! fetch may be in flight; overlapping calls are rejected.

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

use super::formatter::{format_summary, FormatError};
use super::post::PostSummary;
use crate::api::{ContentSource, Ordering, Query, SearchResponse, POST_TYPE};

/// Fields the listing needs
pub const LISTING_FIELDS: [&str; 3] = ["post.title", "post.subtitle", "post.author"];

/// What a `load_more` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No cursor left; nothing fetched
    Exhausted,
    /// Another fetch is in flight; nothing fetched
    Busy,
    /// The page was appended with this many posts
    Appended(usize),
    /// Fetch or decoding failed; state unchanged
    Failed,
}

#[derive(Debug, Default)]
struct LoaderState {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
    in_flight: bool,
}

/// Accumulates listing pages
pub struct PaginationLoader {
    source: Arc<dyn ContentSource>,
    state: Mutex<LoaderState>,
}

/// Clears the in-flight flag even if the fetch future is dropped
struct InFlight<'a>(&'a Mutex<LoaderState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().in_flight = false;
    }
}

impl PaginationLoader {
    pub fn new(
        source: Arc<dyn ContentSource>,
        posts: Vec<PostSummary>,
        next_page: Option<String>,
    ) -> Self {
        Self {
            source,
            state: Mutex::new(LoaderState {
                posts,
                next_page,
                in_flight: false,
            }),
        }
    }

    /// Query for the first listing page, newest posts first
    pub fn listing_query(per_page: u32, reference: Option<String>) -> Query {
        Query::documents_of_type(POST_TYPE)
            .fetch(LISTING_FIELDS)
            .page_size(per_page)
            .order_by(Ordering::desc("document.first_publication_date"))
            .reference(reference)
    }

    /// Fetch the first page and start a loader from it
    pub async fn first_page(
        source: Arc<dyn ContentSource>,
        per_page: u32,
        reference: Option<String>,
    ) -> Result<Self> {
        let response = source
            .query(&Self::listing_query(per_page, reference))
            .await?;
        let posts = format_page(&response)?;
        tracing::debug!(
            "First listing page: {} posts, more: {}",
            posts.len(),
            response.next_page.is_some()
        );
        Ok(Self::new(source, posts, response.next_page))
    }

    /// Follow the cursor once and append the page
    pub async fn load_more(&self) -> LoadOutcome {
        let url = {
            let mut state = self.state.lock();
            let Some(url) = state.next_page.clone() else {
                return LoadOutcome::Exhausted;
            };
            if state.in_flight {
                tracing::debug!("Fetch already in flight, ignoring load request");
                return LoadOutcome::Busy;
            }
            state.in_flight = true;
            url
        };

        let _in_flight = InFlight(&self.state);

        let page = match self.source.fetch_page(&url).await {
            Ok(response) => format_page(&response).map(|posts| (posts, response.next_page)),
            Err(e) => {
                tracing::warn!("Failed to load more posts from {}: {}", url, e);
                return LoadOutcome::Failed;
            }
        };

        match page {
            Ok((posts, next_page)) => {
                let count = posts.len();
                let mut state = self.state.lock();
                state.posts.extend(posts);
                state.next_page = next_page;
                LoadOutcome::Appended(count)
            }
            Err(e) => {
                tracing::warn!("Discarding page {}: {}", url, e);
                LoadOutcome::Failed
            }
        }
    }

    /// Load up to `pages` more pages; returns how many were appended
    pub async fn load_pages(&self, pages: usize) -> usize {
        let mut loaded = 0;
        while loaded < pages {
            match self.load_more().await {
                LoadOutcome::Appended(_) => loaded += 1,
                LoadOutcome::Exhausted | LoadOutcome::Busy | LoadOutcome::Failed => break,
            }
        }
        loaded
    }

    /// Load until the cursor runs out or a fetch fails
    pub async fn load_all(&self) -> usize {
        let mut loaded = 0;
        loop {
            let before = self.next_page();
            match self.load_more().await {
                LoadOutcome::Appended(_) => loaded += 1,
                LoadOutcome::Exhausted | LoadOutcome::Busy | LoadOutcome::Failed => break,
            }
            if self.has_more() && self.next_page() == before {
                tracing::warn!("Cursor did not advance, stopping pagination");
                break;
            }
        }
        loaded
    }

    /// Posts loaded so far, in arrival order
    pub fn posts(&self) -> Vec<PostSummary> {
        self.state.lock().posts.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_page(&self) -> Option<String> {
        self.state.lock().next_page.clone()
    }

    /// Whether the "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.state.lock().next_page.is_some()
    }
}

fn format_page(response: &SearchResponse) -> Result<Vec<PostSummary>, FormatError> {
    response.results.iter().map(format_summary).collect()
}
