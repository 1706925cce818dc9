//! Date helper functions

use chrono::{DateTime, Locale, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;
use crate::i18n::I18n;

/// Formats publication timestamps for the configured locale and timezone.
///
/// Listing cards and post pages both go through this type, so a date reads
/// the same wherever it appears.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    timezone: Tz,
    date_format: String,
    time_format: String,
}

impl DateFormatter {
    pub fn new(language: &str, timezone: &str, date_format: &str, time_format: &str) -> Self {
        Self {
            locale: parse_locale(language),
            timezone: parse_timezone(timezone),
            date_format: moment_to_chrono_format(date_format),
            time_format: moment_to_chrono_format(time_format),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            &config.language,
            &config.timezone,
            &config.date_format,
            &config.time_format,
        )
    }

    /// `dd MMM yyyy` style date; empty for an unpublished document
    pub fn format_date(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| self.render(d, &self.date_format))
            .unwrap_or_default()
    }

    pub fn format_time(&self, date: &DateTime<Utc>) -> String {
        self.render(date, &self.time_format)
    }

    /// "edited on" note, present only when the last publication differs
    /// from the first at millisecond precision
    pub fn edited_annotation(
        &self,
        first: Option<&DateTime<Utc>>,
        last: Option<&DateTime<Utc>>,
        i18n: &I18n,
    ) -> Option<String> {
        let (first, last) = (first?, last?);
        if first.timestamp_millis() == last.timestamp_millis() {
            return None;
        }

        let date = self.render(last, &self.date_format);
        let time = self.format_time(last);
        Some(i18n.get_with("post.edited", &[date.as_str(), time.as_str()]))
    }

    fn render(&self, date: &DateTime<Utc>, format: &str) -> String {
        self.timezone
            .from_utc_datetime(&date.naive_utc())
            .format_localized(format, self.locale)
            .to_string()
    }
}

/// `pt-BR` / `pt_BR` / `en` to a chrono locale
fn parse_locale(language: &str) -> Locale {
    let normalized = language.replace('-', "_");
    let candidate = match normalized.as_str() {
        "en" => "en_US",
        "pt" => "pt_BR",
        other => other,
    };

    Locale::try_from(candidate).unwrap_or_else(|_| {
        tracing::warn!("Unknown locale {:?}, falling back to en_US", language);
        Locale::en_US
    })
}

fn parse_timezone(timezone: &str) -> Tz {
    if timezone.is_empty() {
        return Tz::UTC;
    }
    timezone.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, using UTC", timezone);
        Tz::UTC
    })
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        // Year
        ("YYYY", "%Y"),
        ("YY", "%y"),
        // Month
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        // Day of month
        ("DD", "%d"),
        // Hour
        ("HH", "%H"),
        ("hh", "%I"),
        // Minute
        ("mm", "%M"),
        // Second
        ("ss", "%S"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
