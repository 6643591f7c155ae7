//! Helpers for building HTML fragments

use std::fmt::Display;
use std::sync::LazyLock;

use chrono::{DateTime, Offset, TimeZone, Utc};
use regex::Regex;

/// Matches `printf`-style placeholders: `%s`, `%d` and the `%%` escape
pub static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%|%[sd]").expect("Invalid PLACEHOLDER_REGEX"));

/// Escape text for inclusion in HTML element content or attributes.
pub fn html_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `%s`/`%d` placeholders with `args` in order.
///
/// Placeholders without a matching argument are left in place; `%%` yields
/// a literal percent sign.
pub fn sprintf(format: &str, args: &[&dyn Display]) -> String {
    let mut next = args.iter();
    PLACEHOLDER_REGEX
        .replace_all(format, |caps: &regex::Captures<'_>| {
            if &caps[0] == "%%" {
                return "%".to_string();
            }
            match next.next() {
                Some(arg) => arg.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// A timestamp split for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeString {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    /// UTC offset, e.g. ` GMT+2` (empty for UTC)
    pub zone: String,
}

impl TimeString {
    /// Format a unix timestamp (seconds) in the given time zone.
    pub fn from_timestamp<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<Self>
    where
        Tz::Offset: Display,
    {
        let utc: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)?;
        let local = utc.with_timezone(tz);
        let offset_minutes = local.offset().fix().local_minus_utc() / 60;
        Some(Self {
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M:%S").to_string(),
            zone: format_zone(offset_minutes),
        })
    }
}

fn format_zone(offset_minutes: i32) -> String {
    if offset_minutes == 0 {
        return String::new();
    }
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let hours = offset_minutes.abs() / 60;
    let minutes = offset_minutes.abs() % 60;
    if minutes == 0 {
        format!(" GMT{}{}", sign, hours)
    } else {
        format!(" GMT{}{}:{:02}", sign, hours, minutes)
    }
}
