//! Rich-text block model

use serde::{Deserialize, Serialize};

/// One block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextBlock {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
}

impl RichTextBlock {
    /// Text carried by the block, if it is a text block
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            RichTextBlock::Paragraph(t)
            | RichTextBlock::Heading1(t)
            | RichTextBlock::Heading2(t)
            | RichTextBlock::Heading3(t)
            | RichTextBlock::Heading4(t)
            | RichTextBlock::Heading5(t)
            | RichTextBlock::Heading6(t)
            | RichTextBlock::Preformatted(t)
            | RichTextBlock::ListItem(t)
            | RichTextBlock::OrderedListItem(t) => Some(t),
            RichTextBlock::Image(_) | RichTextBlock::Embed(_) => None,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            RichTextBlock::Heading1(_) => Some(1),
            RichTextBlock::Heading2(_) => Some(2),
            RichTextBlock::Heading3(_) => Some(3),
            RichTextBlock::Heading4(_) => Some(4),
            RichTextBlock::Heading5(_) => Some(5),
            RichTextBlock::Heading6(_) => Some(6),
            _ => None,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        RichTextBlock::Paragraph(TextBlock::plain(text))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl TextBlock {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            spans: Vec::new(),
        }
    }
}

/// Inline formatting over `[start, end)`, in characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub kind: SpanKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink(LinkData),
    #[serde(rename = "label")]
    Label(LabelData),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelData {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageBlock {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub html: Option<String>,
}
