//! Normalization shared by every adapter: validation, truncation, source
//! inference, posted-date and salary parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::models::posting::{
    DESCRIPTION_MAX_CHARS, REQUIREMENTS_MAX, REQUIREMENT_MAX_CHARS,
};
use crate::models::{Posting, RawPosting, Salary};
use crate::sources::SourceKind;

/// Job boards recognised in apply links and "via" labels, checked in order.
const KNOWN_BOARDS: &[(&str, &str)] = &[
    ("linkedin", "LinkedIn"),
    ("glassdoor", "Glassdoor"),
    ("indeed", "Indeed"),
    ("ziprecruiter", "ZipRecruiter"),
];

static RELATIVE_AGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\+?\s*(minute|min|hour|hr|day|week|month|year)s?\b")
        .expect("relative age pattern is valid")
});

/// Decodes provider result items one by one, dropping those that do not
/// match the expected shape instead of failing the whole payload.
pub fn lenient_items<T: DeserializeOwned>(items: Vec<Value>, source: SourceKind) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(job) => Some(job),
            Err(e) => {
                debug!(%source, error = %e, "Skipping malformed result item");
                None
            }
        })
        .collect();
    if decoded.len() < total {
        debug!(%source, skipped = total - decoded.len(), total, "Dropped malformed result items");
    }
    decoded
}

/// Turns extracted provider fields into a [`Posting`], or `None` if the
/// title or company is missing.
pub fn finalize(raw: RawPosting) -> Option<Posting> {
    let (Some(title), Some(company)) = (
        raw.title.as_deref().and_then(clean_text),
        raw.company.as_deref().and_then(clean_text),
    ) else {
        debug!(id = %raw.id, source = %raw.source, "Dropping posting without title or company");
        return None;
    };

    let description = raw
        .description
        .as_deref()
        .and_then(clean_text)
        .map(|d| truncate_chars(&d, DESCRIPTION_MAX_CHARS))
        .unwrap_or_default();

    let requirements = raw
        .requirements
        .iter()
        .filter_map(|r| clean_text(r))
        .take(REQUIREMENTS_MAX)
        .map(|r| truncate_chars(&r, REQUIREMENT_MAX_CHARS))
        .collect();

    let apply_url = raw
        .apply_url
        .as_deref()
        .map(str::trim)
        .filter(|u| is_absolute_url(u))
        .map(str::to_string)
        .unwrap_or(raw.fallback_url);

    Some(Posting {
        id: raw.id,
        title,
        company,
        location: raw.location.as_deref().and_then(clean_text),
        salary: raw.salary,
        employment_type: raw.employment_type.as_deref().and_then(clean_text),
        description,
        requirements,
        posted_days_ago: raw.posted_days_ago,
        apply_url,
        source: raw.source,
        match_score: None,
    })
}

/// Trims and collapses internal whitespace; `None` when nothing is left.
pub fn clean_text(text: &str) -> Option<String> {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

pub fn is_absolute_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Looks for a known job board name in any of `hints` (URLs, hosts, "via" text).
pub fn infer_board(hints: &[&str]) -> Option<&'static str> {
    hints.iter().find_map(|hint| {
        let hint = hint.to_lowercase();
        KNOWN_BOARDS
            .iter()
            .find(|(needle, _)| hint.contains(needle))
            .map(|(_, label)| *label)
    })
}

/// Days between a provider timestamp and `now`, floored, never negative.
///
/// Accepts RFC 3339, naive ISO date-times, plain dates and relative text such
/// as "3 days ago". Anything unparseable counts as 0.
pub fn days_ago(text: Option<&str>, now: DateTime<Utc>) -> u32 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0;
    };

    if let Some(posted) = parse_timestamp(text) {
        return whole_days_between(posted, now);
    }

    relative_days(text).unwrap_or(0)
}

pub fn days_since_epoch_seconds(seconds: i64, now: DateTime<Utc>) -> u32 {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(|posted| whole_days_between(posted, now))
        .unwrap_or(0)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn relative_days(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    if lower.contains("today") || lower.contains("just posted") || lower.contains("just now") {
        return Some(0);
    }

    let caps = RELATIVE_AGE.captures(&lower)?;
    let amount: u32 = caps[1].parse().ok()?;
    let days = match &caps[2] {
        "minute" | "min" | "hour" | "hr" => 0,
        "day" => amount,
        "week" => amount.saturating_mul(7),
        "month" => amount.saturating_mul(30),
        _ => amount.saturating_mul(365),
    };
    Some(days)
}

fn whole_days_between(posted: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now - posted).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Structured pay from numeric bounds.
///
/// Both bounds give a range; a single minimum reads as `$120k+`.
pub fn salary_from_bounds(min: Option<f64>, max: Option<f64>) -> Option<Salary> {
    let positive = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
    match (positive(min), positive(max)) {
        (Some(min), Some(max)) => Some(Salary::Range {
            min: min.min(max),
            max: min.max(max),
        }),
        (Some(min), None) => Some(Salary::Text(format!("${}k+", (min / 1000.0).round()))),
        (None, Some(max)) => Some(Salary::Text(format!(
            "up to ${}k",
            (max / 1000.0).round()
        ))),
        (None, None) => None,
    }
}

pub fn salary_from_text(text: Option<&str>) -> Option<Salary> {
    text.and_then(clean_text).map(Salary::Text)
}

/// Percent-encodes a query component for fallback search URLs.
pub fn encode_query(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}
