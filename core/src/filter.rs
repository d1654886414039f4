// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use jiff::Zoned;

use crate::localdb::EventRecord;
use crate::search::{ParsedSearch, default_range};

/// Selects the events to show.
///
/// The same conditions are evaluated in memory by [`EventFilter::matches`] and in SQL by
/// [`crate::localdb::Events::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Window start, ms since epoch; events ending at or before it are hidden.
    pub start_ms: Option<i64>,
    /// Window end, ms since epoch; events starting after it are hidden.
    pub end_ms: Option<i64>,
    /// Only events modified strictly after this instant.
    pub updated_since_ms: Option<i64>,
    pub show_cancelled: bool,
    /// Calendars to include, `None` for all.
    pub calendar_ids: Option<Vec<String>>,
    /// Only events tagged with at least one of these schedules, empty for all.
    pub schedules: Vec<String>,
    /// Case-insensitive text in summary, description or location.
    pub text: Option<String>,
}

impl EventFilter {
    /// From now to the end of next month.
    pub fn default_window(now: &Zoned) -> Self {
        let (start, end) = default_range(now);
        Self {
            start_ms: Some(start.timestamp().as_millisecond()),
            end_ms: end.map(|end| end.timestamp().as_millisecond()),
            ..Default::default()
        }
    }

    /// Applies parsed search bounds; the window only changes when both ends are given.
    pub fn apply_search(&mut self, parsed: &ParsedSearch) {
        if let (Some(start), Some(end)) = (&parsed.start, &parsed.end) {
            self.start_ms = Some(start.timestamp().as_millisecond());
            self.end_ms = Some(end.timestamp().as_millisecond());
        }
        self.updated_since_ms = parsed
            .updated_since
            .as_ref()
            .map(|since| since.timestamp().as_millisecond());
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        (self.show_cancelled || !event.is_cancelled())
            && match (self.start_ms, event.end_ms) {
                (Some(start), Some(end)) => start < end,
                _ => true,
            }
            && match (event.start_ms, self.end_ms) {
                (Some(start), Some(end)) => start <= end,
                _ => true,
            }
            && self
                .calendar_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&event.calendar_id))
            && self
                .updated_since_ms
                .is_none_or(|since| event.updated_ms.is_some_and(|updated| updated > since))
            && (self.schedules.is_empty()
                || event.schedules.iter().any(|s| self.schedules.contains(s)))
            && self.matches_text(event)
    }

    fn matches_text(&self, event: &EventRecord) -> bool {
        let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = text.to_lowercase();
        [&event.summary, &event.description, &event.location]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
