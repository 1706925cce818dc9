//! Content API access
//!
//! A thin client over the headless CMS search API. The rest of the crate
//! only depends on the [`ContentSource`] trait and the raw [`Document`] /
//! [`SearchResponse`] shapes.

mod client;
mod document;
mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiError, ContentClient, ContentSource};
pub use document::{parse_timestamp, ApiInfo, ApiRef, Document, SearchResponse};
pub use query::{Ordering, Predicate, Query};

/// Custom type holding blog posts
pub const POST_TYPE: &str = "post";
