//! Post view models

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::richtext::RichTextBlock;

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// Content-system unique identifier, also the URL slug
    pub uid: String,

    /// First publication; `None` for documents never published
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub summary: PostSummary,

    /// Last modification
    pub last_publication_date: Option<DateTime<Utc>>,

    pub banner_url: Option<String>,

    /// Ordered content sections
    pub content: Vec<ContentSection>,
}

/// A section of a post: an optional heading and a rich-text body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSection {
    pub heading: Option<String>,
    pub body: Vec<RichTextBlock>,
}

impl ContentSection {
    pub fn new(heading: Option<&str>, body: Vec<RichTextBlock>) -> Self {
        Self {
            heading: heading.map(str::to_string),
            body,
        }
    }
}

/// A neighbouring post linked from a detail page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavPost {
    pub uid: String,
    pub title: String,
}

/// Links to the posts published before and after the current one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostNavigation {
    pub previous: Option<NavPost>,
    pub next: Option<NavPost>,
}

impl PostNavigation {
    pub fn is_empty(&self) -> bool {
        self.previous.is_none() && self.next.is_none()
    }
}
