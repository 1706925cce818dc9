//! Whole-page rendering for the listing, post, loading and 404 pages

use anyhow::Result;
use tera::Context;

use super::view::{comments_view, NavView, PostCard, PostPage, SiteView};
use super::TemplateRenderer;
use crate::config::SiteConfig;
use crate::content::{PostDetail, PostNavigation, PostSummary};
use crate::helpers::{full_url_for, listing_path, post_path, url_for, DateFormatter};
use crate::i18n::I18n;

/// Renders complete HTML pages for one site
pub struct PageRenderer {
    templates: TemplateRenderer,
    config: SiteConfig,
    i18n: I18n,
    dates: DateFormatter,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig, i18n: I18n) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            config: config.clone(),
            dates: DateFormatter::from_config(config),
            i18n,
        })
    }

    /// Listing page `page` (1-based) showing `posts`. The "load more" link
    /// to the next page is only rendered when `has_more` is set.
    pub fn listing(
        &self,
        posts: &[PostSummary],
        page: usize,
        has_more: bool,
        preview: bool,
    ) -> Result<String> {
        let mut context = self.base_context(&listing_path(&self.config, page), preview);

        let cards: Vec<PostCard> = posts
            .iter()
            .map(|p| PostCard::new(p, &self.config, &self.dates))
            .collect();
        let load_more =
            has_more.then(|| url_for(&self.config, &listing_path(&self.config, page + 1)));

        context.insert("posts", &cards);
        context.insert("load_more", &load_more);
        self.templates.render("index.html", &context)
    }

    pub fn post(
        &self,
        detail: &PostDetail,
        nav: &PostNavigation,
        preview: bool,
    ) -> Result<String> {
        let mut context = self.base_context(&post_path(&detail.summary.uid), preview);

        context.insert(
            "post",
            &PostPage::new(detail, &self.config, &self.dates, &self.i18n),
        );
        context.insert("nav", &NavView::new(nav, &self.config));
        context.insert("comments", &comments_view(&self.config.comments));
        self.templates.render("post.html", &context)
    }

    /// Placeholder served while a page cannot be produced yet
    pub fn loading(&self, path: &str) -> Result<String> {
        let context = self.base_context(path, false);
        self.templates.render("loading.html", &context)
    }

    pub fn not_found(&self, preview: bool) -> Result<String> {
        let context = self.base_context("404.html", preview);
        self.templates.render("404.html", &context)
    }

    fn base_context(&self, current_path: &str, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteView::new(&self.config));
        context.insert("t", &self.i18n.get_all_translations());
        context.insert("canonical", &full_url_for(&self.config, current_path));
        context.insert("current_path", current_path);
        context.insert("preview", &preview);
        context
    }
}
