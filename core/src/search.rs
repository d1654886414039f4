// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Structured date-range search text: `start:<date|now|YYYY-MM> end-of:<date|YYYY-MM>
//! updated-since:<date>`, or a bare four-digit year.

use std::sync::LazyLock;

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan, Zoned};
use regex::Regex;

static START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"start:(\S+)").expect("valid regex"));
static END_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"end-of:(\S+)").expect("valid regex"));
static UPDATED_SINCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"updated-since:(\S+)").expect("valid regex"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid regex"));
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})$").expect("valid regex"));

/// Bounds parsed from search text, each optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSearch {
    pub start: Option<Zoned>,
    pub end: Option<Zoned>,
    pub updated_since: Option<Zoned>,
}

impl ParsedSearch {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.updated_since.is_none()
    }
}

/// Parses search text relative to `now`, dates are read in `now`'s time zone.
///
/// Unrecognized text yields an empty result.
pub fn parse_search_text(text: &str, now: &Zoned) -> ParsedSearch {
    let text = text.trim();
    if text.is_empty() {
        return ParsedSearch::default();
    }

    if let Some(parsed) = parse_structured(text, now) {
        return parsed;
    }

    if YEAR.is_match(text) {
        let start = text
            .parse::<i16>()
            .ok()
            .and_then(|year| Date::new(year, 1, 1).ok())
            .and_then(|date| date.to_zoned(now.time_zone().clone()).ok());
        let end = start
            .as_ref()
            .and_then(|start| start.date().last_of_year().tomorrow().ok())
            .and_then(|next| end_before(next, now.time_zone()));
        return ParsedSearch {
            start,
            end,
            updated_since: None,
        };
    }

    tracing::debug!(text, "search text is not in a recognized form");
    ParsedSearch::default()
}

fn parse_structured(text: &str, now: &Zoned) -> Option<ParsedSearch> {
    let start = START.captures(text).map(|c| c[1].to_string());
    let end = END_OF.captures(text).map(|c| c[1].to_string());
    let updated = UPDATED_SINCE.captures(text).map(|c| c[1].to_string());
    if start.is_none() && end.is_none() && updated.is_none() {
        return None;
    }

    let tz = now.time_zone();
    let start = start.and_then(|value| match value.as_str() {
        "now" => Some(now.clone()),
        value => parse_iso(value, tz),
    });
    let end = end.and_then(|value| {
        if YEAR_MONTH.is_match(&value) {
            let first = parse_iso(&value, tz)?;
            end_before(first.date().last_of_month().tomorrow().ok()?, tz)
        } else {
            let at = parse_iso(&value, tz)?;
            end_before(at.date().tomorrow().ok()?, tz)
        }
    });
    let updated_since = updated.and_then(|value| parse_iso(&value, tz));

    Some(ParsedSearch {
        start,
        end,
        updated_since,
    })
}

/// Formats bounds back into the structured syntax.
pub fn to_structured_text(parsed: &ParsedSearch, now: &Zoned) -> String {
    let mut parts = Vec::new();
    if let Some(start) = &parsed.start {
        let value = if start.date() == now.date() {
            "now".to_string()
        } else if start.day() == 1 {
            start.strftime("%Y-%m").to_string()
        } else {
            start.date().to_string()
        };
        parts.push(format!("start:{value}"));
    }
    if let Some(end) = &parsed.end {
        let value = if end.day() == end.days_in_month() {
            end.strftime("%Y-%m").to_string()
        } else {
            end.date().to_string()
        };
        parts.push(format!("end-of:{value}"));
    }
    if let Some(updated) = &parsed.updated_since {
        parts.push(format!("updated-since:{}", updated.date()));
    }
    parts.join(" ")
}

/// The default window: from now to the end of next month.
pub fn default_range(now: &Zoned) -> (Zoned, Option<Zoned>) {
    let end = now
        .date()
        .first_of_month()
        .checked_add(2.months())
        .ok()
        .and_then(|first| end_before(first, now.time_zone()));
    (now.clone(), end)
}

/// The last millisecond before the start of `date`.
fn end_before(date: Date, tz: &TimeZone) -> Option<Zoned> {
    date.to_zoned(tz.clone())
        .and_then(|start| start.checked_sub(1.millisecond()))
        .ok()
}

/// Reads an ISO 8601 year, month, date or date-time; floating values are placed in `tz`.
fn parse_iso(value: &str, tz: &TimeZone) -> Option<Zoned> {
    if let Ok(timestamp) = value.parse::<Timestamp>() {
        return Some(timestamp.to_zoned(tz.clone()));
    }
    if let Ok(datetime) = value.parse::<DateTime>() {
        return datetime.to_zoned(tz.clone()).ok();
    }
    let date = if let Ok(date) = value.parse::<Date>() {
        date
    } else if let Some(c) = YEAR_MONTH.captures(value) {
        Date::new(c[1].parse().ok()?, c[2].parse().ok()?, 1).ok()?
    } else if YEAR.is_match(value) {
        Date::new(value.parse().ok()?, 1, 1).ok()?
    } else {
        return None;
    };
    date.to_zoned(tz.clone()).ok()
}
