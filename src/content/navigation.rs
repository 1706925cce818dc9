//! Previous/next post links

use super::formatter::format_nav;
use super::post::{NavPost, PostNavigation};
use crate::api::{ContentSource, Document, Ordering, Query, POST_TYPE};

const PUBLICATION_DATE: &str = "document.first_publication_date";

/// Find the posts published right before and right after `current`.
///
/// Lookup failures only cost the links; the page still renders.
pub async fn fetch_navigation(
    source: &dyn ContentSource,
    current: &Document,
    reference: Option<String>,
) -> PostNavigation {
    let neighbour = |ordering: Ordering| {
        Query::documents_of_type(POST_TYPE)
            .fetch(["post.title"])
            .page_size(1)
            .after(current.id.clone())
            .order_by(ordering)
            .reference(reference.clone())
    };

    let previous = first_result(source, &neighbour(Ordering::desc(PUBLICATION_DATE))).await;
    let next = first_result(source, &neighbour(Ordering::asc(PUBLICATION_DATE))).await;

    PostNavigation { previous, next }
}

async fn first_result(source: &dyn ContentSource, query: &Query) -> Option<NavPost> {
    match source.query(query).await {
        Ok(response) => {
            let doc = response.results.first()?;
            match format_nav(doc) {
                Ok(nav) => Some(nav),
                Err(e) => {
                    tracing::warn!("Skipping navigation link: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!("Failed to load post navigation: {}", e);
            None
        }
    }
}
