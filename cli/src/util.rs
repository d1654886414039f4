// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::{Timestamp, ToSpan, tz::TimeZone};

/// The output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Formats an epoch-millisecond instant in `tz`, empty when out of range.
pub fn format_ms(ms: i64, tz: &TimeZone) -> String {
    match Timestamp::from_millisecond(ms) {
        Ok(ts) => ts.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M").to_string(),
        Err(e) => {
            tracing::warn!(ms, err = %e, "timestamp out of range");
            String::new()
        }
    }
}

/// Formats the span of an event.
///
/// All-day ends are exclusive and shown as the last day; timed spans on one day share the date.
pub fn format_time_range(
    start_ms: Option<i64>,
    end_ms: Option<i64>,
    all_day: bool,
    tz: &TimeZone,
) -> String {
    let zoned = |ms: i64| {
        Timestamp::from_millisecond(ms)
            .ok()
            .map(|ts| ts.to_zoned(tz.clone()))
    };
    let (Some(start), end) = (start_ms.and_then(zoned), end_ms.and_then(zoned)) else {
        return String::new();
    };

    if all_day {
        let first = start.date();
        let last = end
            .and_then(|end| end.date().checked_sub(1.day()).ok())
            .filter(|last| *last > first);
        return match last {
            Some(last) => format!("{first}~{last}"),
            None => first.to_string(),
        };
    }

    match end {
        Some(end) if end.date() == start.date() => format!(
            "{} {}~{}",
            start.date(),
            start.strftime("%H:%M"),
            end.strftime("%H:%M")
        ),
        Some(end) => format!(
            "{}~{}",
            start.strftime("%Y-%m-%d %H:%M"),
            end.strftime("%Y-%m-%d %H:%M")
        ),
        None => start.strftime("%Y-%m-%d %H:%M").to_string(),
    }
}
