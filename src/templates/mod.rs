//! Built-in blog templates using Tera template engine
//!
//! All templates are embedded directly in the binary.

mod pages;
mod view;

pub use pages::PageRenderer;
pub use view::{NavLink, NavView, PostCard, PostPage, SectionView, SiteView};

use anyhow::Result;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers::html_escape;

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Paths and pre-rendered rich text must go out untouched; text
        // fields are escaped explicitly with `esc`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("loading.html", include_str!("blog/loading.html")),
            ("404.html", include_str!("blog/404.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
            (
                "partials/preview.html",
                include_str!("blog/partials/preview.html"),
            ),
            (
                "partials/comments.html",
                include_str!("blog/partials/comments.html"),
            ),
        ])?;

        tera.register_filter("esc", esc_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape HTML special characters, leaving `/` alone
fn esc_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("esc", "value", String, value);
    Ok(tera::Value::String(html_escape(&s)))
}
