//! Reading-time estimate for a post

use serde::Serialize;

use super::post::ContentSection;
use crate::i18n::I18n;
use crate::richtext::as_text;

/// Assumed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated time to read a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ReadingTime {
    /// Under a minute
    Quick,
    /// 1 to 59 minutes
    Minutes(u64),
    /// 60 minutes or more, in whole hours
    Hours(u64),
}

impl ReadingTime {
    /// Estimate from post content
    pub fn estimate(content: &[ContentSection]) -> Self {
        Self::from_word_count(count_words(content))
    }

    /// Minutes are rounded up; hours are whole hours, rounded down
    pub fn from_word_count(words: usize) -> Self {
        let minutes = words.div_ceil(WORDS_PER_MINUTE) as u64;
        if minutes < 1 {
            ReadingTime::Quick
        } else if minutes < 60 {
            ReadingTime::Minutes(minutes)
        } else {
            ReadingTime::Hours(minutes / 60)
        }
    }

    pub fn label(&self, i18n: &I18n) -> String {
        match *self {
            ReadingTime::Quick => i18n.get("reading_time.quick"),
            ReadingTime::Minutes(n) => i18n.get_count("reading_time.minutes", n),
            ReadingTime::Hours(n) => i18n.get_plural("reading_time.hours", n),
        }
    }
}

/// Words in every heading plus words in the plain text of every body.
/// A missing heading counts as no words.
pub fn count_words(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            let heading = section
                .heading
                .as_deref()
                .map(|h| h.split_whitespace().count())
                .unwrap_or(0);
            let body = as_text(&section.body).split_whitespace().count();
            heading + body
        })
        .sum()
}
