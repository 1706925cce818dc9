//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `api.endpoint`
pub const ENV_API_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `api.access_token`
pub const ENV_ACCESS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub static_dir: String,
    pub languages_dir: String,

    // Date / Time format
    pub date_format: String,
    pub time_format: String,

    // Listing
    pub per_page: usize,
    pub pagination_dir: String,

    /// Seconds a rendered page stays fresh before it is regenerated
    pub revalidate_secs: u64,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub comments: CommentsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            static_dir: "static".to_string(),
            languages_dir: "languages".to_string(),

            date_format: "DD MMM YYYY".to_string(),
            time_format: "HH:mm".to_string(),

            per_page: 2,
            pagination_dir: "page".to_string(),

            revalidate_secs: 60 * 60 * 24,

            api: ApiConfig::default(),
            comments: CommentsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {:?}", path))?;
        config.api.apply_env();
        Ok(config)
    }
}

/// Content API connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Request timeout; unset means requests are never cut short
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    /// Let the process environment override file values
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_API_ENDPOINT) {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(token) = std::env::var(ENV_ACCESS_TOKEN) {
            if !token.is_empty() {
                self.access_token = Some(token);
            }
        }
    }
}

/// utterances comment widget
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// `owner/name` of the GitHub repository holding the comment issues
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl CommentsConfig {
    pub fn enabled(&self) -> bool {
        !self.repo.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.per_page, 2);
        assert_eq!(config.revalidate_secs, 86_400);
        assert!(!config.comments.enabled());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en
per_page: 5
api:
  endpoint: https://blog.cdn.prismic.io/api/v2
  access_token: secret
comments:
  repo: someone/blog-comments
  issue_term: pathname
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.per_page, 5);
        assert_eq!(config.api.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.api.access_token.as_deref(), Some("secret"));
        assert!(config.comments.enabled());
        assert_eq!(config.date_format, "DD MMM YYYY");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From File\nrevalidate_secs: 60\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From File");
        assert_eq!(config.revalidate_secs, 60);
    }
}
