//! Data structures for template context

use serde::Serialize;

use crate::config::{CommentsConfig, SiteConfig};
use crate::content::{NavPost, PostDetail, PostNavigation, PostSummary, ReadingTime};
use crate::helpers::{meta_generator, post_path, url_for, DateFormatter};
use crate::i18n::I18n;
use crate::richtext::as_html;

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub generator: String,
}

impl SiteView {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, ""),
            generator: meta_generator(),
        }
    }
}

/// A post as a listing card. Post pages reuse it for their header so both
/// show the same title, author and date.
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl PostCard {
    pub fn new(summary: &PostSummary, config: &SiteConfig, dates: &DateFormatter) -> Self {
        Self {
            uid: summary.uid.clone(),
            path: url_for(config, &post_path(&summary.uid)),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: dates.format_date(summary.first_publication_date.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: Option<String>,
    /// Rendered rich text
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    #[serde(flatten)]
    pub card: PostCard,
    pub banner: Option<String>,
    pub reading_time: String,
    pub edited: Option<String>,
    pub sections: Vec<SectionView>,
}

impl PostPage {
    pub fn new(
        detail: &PostDetail,
        config: &SiteConfig,
        dates: &DateFormatter,
        i18n: &I18n,
    ) -> Self {
        let summary = &detail.summary;
        Self {
            card: PostCard::new(summary, config, dates),
            banner: detail.banner_url.clone(),
            reading_time: ReadingTime::estimate(&detail.content).label(i18n),
            edited: dates.edited_annotation(
                summary.first_publication_date.as_ref(),
                detail.last_publication_date.as_ref(),
                i18n,
            ),
            sections: detail
                .content
                .iter()
                .map(|section| SectionView {
                    heading: section.heading.clone(),
                    html: as_html(&section.body),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NavView {
    pub previous: Option<NavLink>,
    pub next: Option<NavLink>,
}

impl NavView {
    pub fn new(nav: &PostNavigation, config: &SiteConfig) -> Self {
        let link = |post: &NavPost| NavLink {
            path: url_for(config, &post_path(&post.uid)),
            title: post.title.clone(),
        };
        Self {
            previous: nav.previous.as_ref().map(link),
            next: nav.next.as_ref().map(link),
        }
    }
}

/// Comment widget settings, when configured
pub fn comments_view(config: &CommentsConfig) -> Option<&CommentsConfig> {
    config.enabled().then_some(config)
}
