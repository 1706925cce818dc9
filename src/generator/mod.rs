//! Generator module - renders listing and post pages from the content API
//!
//! The same rendering paths back static generation and the server: listing
//! page N holds the first N API pages accumulated through the pagination
//! loader, and its "load more" link points at page N+1.

use anyhow::{bail, Result};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::api::{ContentSource, POST_TYPE};
use crate::content::{fetch_navigation, format_detail, LoadOutcome, PaginationLoader};
use crate::helpers::{listing_path, post_path, url_for};
use crate::templates::PageRenderer;
use crate::Blog;

/// What a full generation wrote
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub listing_pages: usize,
    /// Uids of the post pages written
    pub posts: Vec<String>,
}

/// Site generator over a content source
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    pages: PageRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        let pages = PageRenderer::new(&blog.config, blog.i18n.clone())?;

        Ok(Self {
            blog: blog.clone(),
            source,
            pages,
        })
    }

    pub fn pages(&self) -> &PageRenderer {
        &self.pages
    }

    fn per_page(&self) -> u32 {
        self.blog.config.per_page.max(1) as u32
    }

    /// Render listing page `page` (1-based). `None` when the collection has
    /// fewer pages.
    pub async fn render_listing(
        &self,
        page: usize,
        reference: Option<String>,
    ) -> Result<Option<String>> {
        if page == 0 {
            return Ok(None);
        }

        let preview = reference.is_some();
        let loader =
            PaginationLoader::first_page(self.source.clone(), self.per_page(), reference).await?;

        let wanted = page - 1;
        let loaded = loader.load_pages(wanted).await;
        if loaded < wanted {
            if loader.has_more() {
                bail!("failed to load listing page {}", page);
            }
            return Ok(None);
        }

        let html = self
            .pages
            .listing(&loader.posts(), page, loader.has_more(), preview)?;
        Ok(Some(html))
    }

    /// Render the page of post `uid`. `None` when the API does not know it.
    pub async fn render_post(&self, uid: &str, reference: Option<String>) -> Result<Option<String>> {
        let Some(doc) = self
            .source
            .get_by_uid(POST_TYPE, uid, reference.clone())
            .await?
        else {
            return Ok(None);
        };

        let detail = format_detail(&doc)?;
        let preview = reference.is_some();
        let nav = fetch_navigation(self.source.as_ref(), &doc, reference).await;

        Ok(Some(self.pages.post(&detail, &nav, preview)?))
    }

    /// Site path of the document with `id`, for redirecting into preview.
    /// Documents that are not posts resolve to the home page.
    pub async fn document_path(&self, id: &str, reference: Option<String>) -> Result<Option<String>> {
        let Some(doc) = self.source.get_by_id(id, reference).await? else {
            return Ok(None);
        };

        let config = &self.blog.config;
        let path = match doc.uid {
            Some(uid) if doc.doc_type == POST_TYPE => url_for(config, &post_path(&uid)),
            _ => url_for(config, ""),
        };
        Ok(Some(path))
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        fs::create_dir_all(&self.blog.public_dir)?;

        // Copy static assets (images, css, etc.)
        self.copy_static_assets()?;

        let mut report = GenerateReport::default();

        // Listing pages, each holding every page before it
        let loader =
            PaginationLoader::first_page(self.source.clone(), self.per_page(), None).await?;
        loop {
            report.listing_pages += 1;
            let page = report.listing_pages;
            let html = self
                .pages
                .listing(&loader.posts(), page, loader.has_more(), false)?;
            self.write_page(&listing_path(&self.blog.config, page), &html)?;

            let before = loader.next_page();
            match loader.load_more().await {
                LoadOutcome::Appended(_) => {}
                LoadOutcome::Exhausted => break,
                LoadOutcome::Busy | LoadOutcome::Failed => {
                    bail!("failed to load listing page {}", page + 1)
                }
            }
            if loader.has_more() && loader.next_page() == before {
                tracing::warn!("Cursor did not advance, stopping pagination");
                break;
            }
        }
        tracing::info!("Generated {} listing pages", report.listing_pages);

        // Post pages; a post can show up on more than one API page
        let mut seen = HashSet::new();
        for summary in loader.posts() {
            if !seen.insert(summary.uid.clone()) {
                continue;
            }
            match self.render_post(&summary.uid, None).await? {
                Some(html) => {
                    self.write_page(&post_path(&summary.uid), &html)?;
                    report.posts.push(summary.uid);
                }
                None => tracing::warn!("Post {} disappeared while generating", summary.uid),
            }
        }
        tracing::info!("Generated {} posts", report.posts.len());

        let not_found = self.pages.not_found(false)?;
        fs::write(self.blog.public_dir.join("404.html"), not_found)?;

        Ok(report)
    }

    /// Delete a page written by an earlier run, given its site-relative
    /// directory
    pub fn remove_page(&self, dir: &str) -> Result<()> {
        if dir.is_empty() {
            return Ok(());
        }
        let dir = self.blog.public_dir.join(dir);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            tracing::info!("Deleted: {:?}", dir);
        }
        Ok(())
    }

    /// Write `html` as the index of the site-relative directory `dir`
    fn write_page(&self, dir: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.blog.public_dir.join(dir).join("index.html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }

    /// Copy static assets (images, etc.) to public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}
