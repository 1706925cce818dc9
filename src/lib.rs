//! spacetraveling: a blog front-end over a headless content API
//!
//! Posts are fetched from a Prismic-style document API and rendered with
//! embedded Tera templates, either to static files (`generate`) or on
//! demand by the built-in server with an incremental regeneration cache.

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied to / served from the site root
    pub static_dir: PathBuf,
    /// Labels for the configured language
    pub i18n: i18n::I18n,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            let mut config = config::SiteConfig::default();
            config.api.apply_env();
            config
        };

        Self::with_config(base_dir, config)
    }

    /// Create a Blog from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Result<Self> {
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        let mut i18n = i18n::I18n::with_builtin(&config.language);
        let languages_dir = base_dir.join(&config.languages_dir);
        if languages_dir.is_dir() {
            i18n.load_languages(&languages_dir)
                .with_context(|| format!("failed to load translations from {:?}", languages_dir))?;
        }

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
            i18n,
        })
    }

    /// Build the content API handle
    pub fn client(&self) -> Result<Arc<dyn api::ContentSource>> {
        let client = api::ContentClient::new(&self.config.api)
            .context("cannot talk to the content API")?;
        Ok(Arc::new(client))
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "title: Space\nlanguage: en\npublic_dir: out\napi:\n  endpoint: https://blog.cdn.prismic.io/api/v2\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Space");
        assert_eq!(blog.public_dir, dir.path().join("out"));
        assert_eq!(blog.i18n.get("listing.load_more"), "Load more posts");
        assert!(blog.client().is_ok());
    }

    #[test]
    fn test_site_translations_override_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("languages")).unwrap();
        std::fs::write(
            dir.path().join("languages/pt-BR.yml"),
            "listing:\n  load_more: Mais posts\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.i18n.get("listing.load_more"), "Mais posts");
    }
}
