//! List site content

use anyhow::Result;
use std::sync::Arc;

use crate::api::ContentSource;
use crate::content::{PaginationLoader, PostSummary};
use crate::helpers::DateFormatter;
use crate::Blog;

/// Print every published post, newest first
pub async fn run(blog: &Blog) -> Result<()> {
    let posts = load_posts(blog, blog.client()?).await?;
    let dates = DateFormatter::from_config(&blog.config);

    println!("Posts ({}):", posts.len());
    for post in posts {
        println!("{}", format_line(&post, &dates));
    }

    Ok(())
}

/// Walk the listing cursor to the end
pub async fn load_posts(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Vec<PostSummary>> {
    let per_page = blog.config.per_page.max(1) as u32;
    let loader = PaginationLoader::first_page(source, per_page, None).await?;
    let pages = loader.load_all().await;
    tracing::debug!("Loaded {} more listing pages", pages);

    if loader.has_more() {
        tracing::warn!("Listing is incomplete, a page failed to load");
    }
    Ok(loader.posts())
}

fn format_line(post: &PostSummary, dates: &DateFormatter) -> String {
    format!(
        "  {} - {} ({}) [{}]",
        dates.format_date(post.first_publication_date.as_ref()),
        post.title,
        post.author,
        post.uid
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{post_document, FakeApi};
    use crate::api::ContentClient;
    use crate::config::SiteConfig;

    #[tokio::test]
    async fn test_load_posts_walks_all_pages() {
        let docs = (1..=5)
            .map(|i| post_document(&format!("post-{}", i), &format!("2021-03-0{}T10:00:00+0000", i)))
            .collect();
        let api = FakeApi::spawn(docs).await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.api.endpoint = api.endpoint.clone();
        let blog = Blog::with_config(dir.path().to_path_buf(), config).unwrap();
        let client = ContentClient::new(&blog.config.api).unwrap();

        let posts = load_posts(&blog, Arc::new(client)).await.unwrap();
        let uids: Vec<_> = posts.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, vec!["post-5", "post-4", "post-3", "post-2", "post-1"]);

        let dates = DateFormatter::from_config(&blog.config);
        assert_eq!(
            format_line(&posts[0], &dates),
            "  05 mar 2021 - Title of post-5 (Joseph Oliveira) [post-5]"
        );
    }
}
