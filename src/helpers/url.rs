//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Site-relative path of a post page, without the root
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", uid)
}

/// Site-relative path of listing page `n` (1-based); page 1 is the home page
pub fn listing_path(config: &SiteConfig, page: usize) -> String {
    if page <= 1 {
        String::new()
    } else {
        format!("{}/{}/", config.pagination_dir, page)
    }
}
