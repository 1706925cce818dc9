//! Mapping raw API documents to post view models

use serde_json::Value;

use super::post::{ContentSection, NavPost, PostDetail, PostSummary};
use crate::api::Document;
use crate::richtext::{as_text, parse_blocks};

/// A document that cannot be shown as a post
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("document {id} has no uid")]
    MissingUid { id: String },

    #[error("document {uid} has malformed content: {reason}")]
    InvalidContent { uid: String, reason: String },
}

/// Listing fields of a post
pub fn format_summary(doc: &Document) -> Result<PostSummary, FormatError> {
    let uid = doc
        .uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| FormatError::MissingUid { id: doc.id.clone() })?;

    Ok(PostSummary {
        uid,
        first_publication_date: doc.first_publication_date,
        title: text_field(&doc.data, "title"),
        subtitle: text_field(&doc.data, "subtitle"),
        author: text_field(&doc.data, "author"),
    })
}

/// Every field of a post, including banner and content sections
pub fn format_detail(doc: &Document) -> Result<PostDetail, FormatError> {
    let summary = format_summary(doc)?;

    let banner_url = doc
        .data
        .get("banner")
        .and_then(|b| b.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    let content = match doc.data.get("content") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(sections)) => sections.iter().map(format_section).collect(),
        Some(other) => {
            return Err(FormatError::InvalidContent {
                uid: summary.uid,
                reason: format!("expected a list of sections, got {}", json_kind(other)),
            })
        }
    };

    Ok(PostDetail {
        summary,
        last_publication_date: doc.last_publication_date,
        banner_url,
        content,
    })
}

/// Title and uid for a navigation link
pub fn format_nav(doc: &Document) -> Result<NavPost, FormatError> {
    let summary = format_summary(doc)?;
    Ok(NavPost {
        uid: summary.uid,
        title: summary.title,
    })
}

fn format_section(section: &Value) -> ContentSection {
    let heading = section
        .get("heading")
        .and_then(Value::as_str)
        .map(str::to_string);
    let body = section.get("body").map(parse_blocks).unwrap_or_default();
    ContentSection { heading, body }
}

/// A text field that may be plain text or a rich-text array
fn text_field(data: &Value, name: &str) -> String {
    match data.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(value @ Value::Array(_)) => as_text(&parse_blocks(value)),
        _ => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
