// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Mapping of remote records to their local rows.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, ToSpan, Zoned};
use mirrorcal_gcal::{CalendarListEntry, Event, EventDateTime};

use crate::error::TransformError;
use crate::localdb::{CalendarRecord, EventRecord};
use crate::schedule::event_schedules;

/// Maps a calendar list entry, the user's `summaryOverride` taking the place of `summary`.
pub fn transform_calendar(entry: CalendarListEntry) -> Result<CalendarRecord, TransformError> {
    if entry.id.is_empty() {
        return Err(TransformError::MissingId);
    }
    let raw = serde_json::to_string(&entry).map_err(|source| TransformError::Encode {
        id: entry.id.clone(),
        source,
    })?;

    let (summary, original_summary) = match entry.summary_override {
        Some(summary_override) if !summary_override.is_empty() => {
            (summary_override, entry.summary)
        }
        _ => (entry.summary.unwrap_or_default(), None),
    };

    Ok(CalendarRecord {
        id: entry.id,
        summary,
        original_summary,
        time_zone: entry.time_zone,
        primary: entry.primary,
        access_role: entry.access_role,
        background_color: entry.background_color,
        selected: entry.selected,
        deleted: entry.deleted,
        dirty: false,
        raw,
    })
}

/// Resolves the time zone of a calendar, UTC when it has none.
pub fn calendar_zone(name: Option<&str>) -> Result<TimeZone, TransformError> {
    match name {
        Some(name) if !name.is_empty() => lookup_zone(name),
        _ => Ok(TimeZone::UTC),
    }
}

/// Maps an event of `calendar_id`, resolving floating times in `calendar_tz`.
pub fn transform_event(
    event: Event,
    calendar_id: &str,
    calendar_tz: &TimeZone,
) -> Result<EventRecord, TransformError> {
    if event.id.is_empty() {
        return Err(TransformError::MissingId);
    }

    let start = event
        .start
        .as_ref()
        .map(|start| resolve(&event.id, "start", start, calendar_tz))
        .transpose()?;

    let end = match (&event.start, &event.end) {
        (_, Some(end)) => {
            let zoned = resolve(&event.id, "end", end, calendar_tz)?;
            let same_day = matches!(
                (&event.start, &end.date),
                (Some(EventDateTime { date: Some(s), .. }), Some(e)) if s == e
            );
            if same_day {
                Some(next_day(&event.id, &zoned)?)
            } else {
                Some(zoned)
            }
        }
        // an open-ended all-day event covers its start day
        (Some(EventDateTime { date: Some(_), .. }), None) => start
            .as_ref()
            .map(|start| next_day(&event.id, start))
            .transpose()?,
        (_, None) => start.clone(),
    };

    let updated_ms = event.updated.as_deref().and_then(|updated| {
        updated
            .parse::<Timestamp>()
            .inspect_err(|err| tracing::warn!(id = %event.id, updated, %err, "invalid updated time"))
            .ok()
            .map(|t| t.as_millisecond())
    });

    let all_day = event.start.as_ref().is_some_and(|s| s.date.is_some());
    let schedules = event_schedules(&event);
    let raw = serde_json::to_string(&event).map_err(|source| TransformError::Encode {
        id: event.id.clone(),
        source,
    })?;

    Ok(EventRecord {
        id: event.id,
        calendar_id: calendar_id.to_string(),
        status: event.status,
        summary: event.summary,
        description: event.description,
        location: event.location,
        start_ms: start.map(|z| z.timestamp().as_millisecond()),
        end_ms: end.map(|z| z.timestamp().as_millisecond()),
        all_day,
        updated: event.updated,
        updated_ms,
        html_link: event.html_link,
        recurring_event_id: event.recurring_event_id,
        schedules,
        dirty: false,
        raw,
    })
}

/// Resolves one start or end value to an instant in its zone.
///
/// Values with an explicit offset are absolute. Floating date-times and dates are read in the
/// value's own zone, falling back to the calendar's.
pub(crate) fn resolve(
    id: &str,
    field: &'static str,
    value: &EventDateTime,
    calendar_tz: &TimeZone,
) -> Result<Zoned, TransformError> {
    let tz = match value.time_zone.as_deref() {
        Some(name) if !name.is_empty() => lookup_zone(name)?,
        _ => calendar_tz.clone(),
    };
    let invalid = |value: &str, source| TransformError::InvalidTime {
        id: id.to_string(),
        field,
        value: value.to_string(),
        source,
    };

    if let Some(date_time) = value.date_time.as_deref() {
        if let Ok(timestamp) = date_time.parse::<Timestamp>() {
            return Ok(timestamp.to_zoned(tz));
        }
        let civil: DateTime = date_time.parse().map_err(|e| invalid(date_time, e))?;
        civil.to_zoned(tz).map_err(|e| invalid(date_time, e))
    } else if let Some(date) = value.date.as_deref() {
        let civil: Date = date.parse().map_err(|e| invalid(date, e))?;
        civil.to_zoned(tz).map_err(|e| invalid(date, e))
    } else {
        Err(TransformError::MissingTime {
            id: id.to_string(),
            field,
        })
    }
}

fn next_day(id: &str, zoned: &Zoned) -> Result<Zoned, TransformError> {
    zoned
        .checked_add(1.day())
        .map_err(|source| TransformError::InvalidTime {
            id: id.to_string(),
            field: "end",
            value: zoned.to_string(),
            source,
        })
}

fn lookup_zone(name: &str) -> Result<TimeZone, TransformError> {
    TimeZone::get(name).map_err(|source| TransformError::UnknownTimeZone {
        name: name.to_string(),
        source,
    })
}
