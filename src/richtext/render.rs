//! Plain-text and HTML rendering of rich text

use super::block::{EmbedBlock, ImageBlock, RichTextBlock, Span, SpanKind, TextBlock};
use crate::helpers::html_escape;

/// Plain text of all text blocks, joined by a single space
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(RichTextBlock::text_block)
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render blocks to HTML.
///
/// Text is escaped, consecutive list items are grouped into one list and
/// embed markup from the API is passed through the sanitizer.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block {
            RichTextBlock::ListItem(_) => Some("ul"),
            RichTextBlock::OrderedListItem(_) => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        match block {
            RichTextBlock::Paragraph(t) => wrap(&mut html, "p", t),
            RichTextBlock::Preformatted(t) => wrap(&mut html, "pre", t),
            RichTextBlock::ListItem(t) | RichTextBlock::OrderedListItem(t) => {
                wrap(&mut html, "li", t)
            }
            RichTextBlock::Image(image) => html.push_str(&image_html(image)),
            RichTextBlock::Embed(embed) => html.push_str(&embed_html(embed)),
            heading => {
                if let (Some(level), Some(t)) = (heading.heading_level(), heading.text_block()) {
                    wrap(&mut html, &format!("h{}", level), t);
                }
            }
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn wrap(html: &mut String, tag: &str, block: &TextBlock) {
    html.push_str(&format!("<{}>{}</{}>", tag, render_spans(block), tag));
}

fn image_html(image: &ImageBlock) -> String {
    let alt = image.alt.as_deref().unwrap_or("");
    let dims = image
        .dimensions
        .map(|d| format!(r#" width="{}" height="{}""#, d.width, d.height))
        .unwrap_or_default();
    let copyright = image
        .copyright
        .as_deref()
        .map(|c| format!(r#" copyright="{}""#, html_escape(c)))
        .unwrap_or_default();
    format!(
        r#"<p class="block-img"><img src="{}" alt="{}"{}{} /></p>"#,
        html_escape(&image.url),
        html_escape(alt),
        dims,
        copyright
    )
}

fn embed_html(embed: &EmbedBlock) -> String {
    let inner = embed
        .oembed
        .html
        .as_deref()
        .map(sanitize_embed)
        .unwrap_or_default();
    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
        html_escape(&embed.oembed.embed_url),
        html_escape(&embed.oembed.kind),
        inner
    )
}

/// Keep iframes (video players) but drop scripts and event handlers
fn sanitize_embed(html: &str) -> String {
    let mut builder = ammonia::Builder::default();
    builder.add_tags(&["iframe"]).add_tag_attributes(
        "iframe",
        &[
            "src",
            "width",
            "height",
            "title",
            "frameborder",
            "allow",
            "allowfullscreen",
        ],
    );
    builder.clean(html).to_string()
}

/// Apply inline spans to a text block.
///
/// Spans may overlap; when a span closes while others opened after it are
/// still active, those are closed and reopened so the output nests.
fn render_spans(block: &TextBlock) -> String {
    let chars: Vec<char> = block.text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<&Span> = block
        .spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::new();
    let mut stack: Vec<&Span> = Vec::new();
    let mut next_span = 0;

    for pos in 0..=len {
        // Close everything ending here
        while let Some(idx) = stack.iter().position(|s| s.end.min(len) == pos) {
            let reopen: Vec<&Span> = stack.drain(idx..).collect();
            for span in reopen.iter().rev() {
                out.push_str(close_tag(&span.kind));
            }
            for span in reopen.into_iter().skip(1) {
                if span.end.min(len) != pos {
                    out.push_str(&open_tag(&span.kind));
                    stack.push(span);
                }
            }
        }

        while next_span < spans.len() && spans[next_span].start == pos {
            out.push_str(&open_tag(&spans[next_span].kind));
            stack.push(spans[next_span]);
            next_span += 1;
        }

        if pos < len {
            match chars[pos] {
                '\n' => out.push_str("<br />"),
                c => out.push_str(&html_escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
    }

    out
}

fn open_tag(kind: &SpanKind) -> String {
    match kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink(link) => {
            let target = link
                .target
                .as_deref()
                .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{}>"#, html_escape(safe_href(&link.url)), target)
        }
        SpanKind::Label(label) => format!(r#"<span class="{}">"#, html_escape(&label.label)),
    }
}

/// Link schemes allowed in rich text; anything else becomes `#`.
/// Relative links have no scheme and pass through.
const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

fn safe_href(url: &str) -> &str {
    match url.trim_start().split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => {
            if LINK_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) {
                url
            } else {
                "#"
            }
        }
        _ => url,
    }
}

fn close_tag(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink(_) => "</a>",
        SpanKind::Label(_) => "</span>",
    }
}
