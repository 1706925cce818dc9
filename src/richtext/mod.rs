//! Structured rich text as delivered by the content API
//!
//! Blocks form a closed set (paragraphs, headings, preformatted text, list
//! items, images and embeds). Rendering is exhaustive over that set.

mod block;
mod render;

pub use block::{
    Dimensions, EmbedBlock, ImageBlock, LabelData, LinkData, OEmbed, RichTextBlock, Span,
    SpanKind, TextBlock,
};
pub use render::{as_html, as_text};

/// Parse a JSON array of blocks, skipping blocks of unknown types
pub fn parse_blocks(value: &serde_json::Value) -> Vec<RichTextBlock> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<RichTextBlock>(item.clone()) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::warn!(
                    "Skipping rich-text block of type {}: {}",
                    item.get("type").and_then(|t| t.as_str()).unwrap_or("?"),
                    e
                );
                None
            }
        })
        .collect()
}
