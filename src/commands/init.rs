//! Initialize a new blog site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
static_dir: static
languages_dir: languages

# Date / Time format
date_format: DD MMM YYYY
time_format: HH:mm

# Listing
per_page: 2
pagination_dir: page

# Seconds before a rendered page is regenerated
revalidate_secs: 86400

# Content API; PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
api:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  access_token:

# utterances comments; leave repo empty to disable
comments:
  repo: ''
  issue_term: pathname
  theme: github-dark
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="27" viewBox="0 0 239 27"><text x="0" y="22" fill="#F8F8F8" font-family="sans-serif" font-size="24">spacetraveling<tspan fill="#FF57B2">.</tspan></text></svg>
"##;

const STYLE: &str = r#"body { background: #1a1d23; color: #d7d7d7; font-family: Inter, sans-serif; }
.container { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.info { display: flex; gap: 1.5rem; list-style: none; padding: 0; font-size: .875rem; }
.load-more { color: #ff57b2; font-weight: 600; }
.banner { width: 100%; max-height: 400px; object-fit: cover; }
.preview { position: fixed; bottom: 1rem; right: 1rem; background: #ff57b2; padding: .5rem 1rem; }
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir.join("static/images"))?;
    fs::create_dir_all(target_dir.join("static/css"))?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("Keeping existing {:?}", config_path);
    } else {
        fs::write(&config_path, CONFIG_TEMPLATE)?;
    }

    fs::write(target_dir.join("static/images/logo.svg"), LOGO)?;
    fs::write(target_dir.join("static/css/style.css"), STYLE)?;

    Ok(())
}
