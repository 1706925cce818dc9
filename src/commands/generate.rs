//! Generate static files

use anyhow::Result;
use chrono::Utc;

use crate::cache::{self, CacheDb};
use crate::generator::Generator;
use crate::helpers::{listing_path, post_path};
use crate::Blog;

/// Generate the static site, skipping while the last output is fresh
pub async fn run(blog: &Blog, force: bool) -> Result<()> {
    let generator = Generator::new(blog, blog.client()?)?;
    run_with(blog, &generator, force).await
}

/// Generate with an existing generator
pub async fn run_with(blog: &Blog, generator: &Generator, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let config_hash = cache::hash_config(&blog.base_dir.join("_config.yml"))?;
    let cached = CacheDb::load(&blog.base_dir);

    if !force
        && blog.public_dir.exists()
        && cached.is_fresh(config_hash, blog.config.revalidate_secs, Utc::now())
    {
        tracing::info!(
            "Output generated at {} is still fresh, skipping (use --force to regenerate)",
            cached
                .generated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        );
        return Ok(());
    }

    let report = generator.generate().await?;

    // Drop pages of posts that were unpublished since the last run
    for uid in cached.removed_posts(&report.posts) {
        generator.remove_page(&post_path(&uid))?;
    }
    for page in (report.listing_pages + 1)..=cached.listing_pages {
        generator.remove_page(&listing_path(&blog.config, page))?;
    }

    let mut new_cache = CacheDb::new();
    new_cache.generated_at = Some(Utc::now());
    new_cache.config_hash = config_hash;
    new_cache.listing_pages = report.listing_pages;
    new_cache.posts = report.posts;
    new_cache.save(&blog.base_dir)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
