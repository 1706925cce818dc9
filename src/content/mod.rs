//! Content module - posts, their formatting, listing and navigation

mod formatter;
pub mod loader;
mod navigation;
mod post;
mod reading_time;

pub use formatter::{format_detail, format_nav, format_summary, FormatError};
pub use loader::{LoadOutcome, PaginationLoader};
pub use navigation::fetch_navigation;
pub use post::{ContentSection, NavPost, PostDetail, PostNavigation, PostSummary};
pub use reading_time::{count_words, ReadingTime, WORDS_PER_MINUTE};
