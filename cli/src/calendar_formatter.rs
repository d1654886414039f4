// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use colored::Color;
use jiff::tz::TimeZone;
use mirrorcal_core::{CalendarRecord, SyncStatus};

use crate::state_formatter::status_label;
use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::{OutputFormat, format_ms};

/// A calendar with its place in the user's settings and what the mirror holds of it.
#[derive(Debug, Clone)]
pub struct CalendarRow {
    pub calendar: CalendarRecord,
    pub synced: bool,
    pub default: bool,
    /// Live mirrored events.
    pub events: i64,
    /// Latest remote modification of its events, ms since epoch.
    pub latest_update: Option<i64>,
    /// Status of its event listing, `None` when never fetched.
    pub status: Option<SyncStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarColumn {
    Marker,
    Id,
    Summary,
    TimeZone,
    AccessRole,
    Events,
    LatestUpdate,
    Status,
}

#[derive(Debug)]
pub struct CalendarFormatter {
    columns: Vec<CalendarColumn>,
    tz: TimeZone,
    format: OutputFormat,
}

impl CalendarFormatter {
    pub fn new(tz: TimeZone, format: OutputFormat) -> Self {
        use CalendarColumn::*;
        Self {
            columns: vec![
                Marker,
                Id,
                TimeZone,
                AccessRole,
                Events,
                LatestUpdate,
                Status,
                Summary,
            ],
            tz,
            format,
        }
    }

    pub fn format<'a>(&'a self, rows: &'a [CalendarRow]) -> Display<'a> {
        Display {
            rows,
            formatter: self,
        }
    }

    fn bound(&self) -> Vec<BoundColumn<'_>> {
        self.columns
            .iter()
            .map(|column| BoundColumn {
                column: *column,
                tz: &self.tz,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    rows: &'a [CalendarRow],
    formatter: &'a CalendarFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.formatter.bound();
        match self.formatter.format {
            OutputFormat::Json => {
                write!(f, "{}", Table::new(TableStyleJson::new(), &columns, self.rows))
            }
            OutputFormat::Table => {
                write!(f, "{}", Table::new(TableStyleBasic::new(), &columns, self.rows))
            }
        }
    }
}

struct BoundColumn<'a> {
    column: CalendarColumn,
    tz: &'a TimeZone,
}

impl TableColumn<CalendarRow> for BoundColumn<'_> {
    fn name(&self) -> Cow<'_, str> {
        match self.column {
            CalendarColumn::Marker => "Marker",
            CalendarColumn::Id => "Id",
            CalendarColumn::Summary => "Summary",
            CalendarColumn::TimeZone => "Time Zone",
            CalendarColumn::AccessRole => "Access Role",
            CalendarColumn::Events => "Events",
            CalendarColumn::LatestUpdate => "Latest Update",
            CalendarColumn::Status => "Status",
        }
        .into()
    }

    fn format<'a>(&self, row: &'a CalendarRow) -> Cow<'a, str> {
        let calendar = &row.calendar;
        match self.column {
            CalendarColumn::Marker => match (row.default, row.synced) {
                (true, _) => "*",
                (false, true) => "+",
                (false, false) => " ",
            }
            .into(),
            CalendarColumn::Id => calendar.id.as_str().into(),
            CalendarColumn::Summary => calendar.summary.as_str().into(),
            CalendarColumn::TimeZone => calendar.time_zone.as_deref().unwrap_or("UTC").into(),
            CalendarColumn::AccessRole => {
                calendar.access_role.as_deref().unwrap_or_default().into()
            }
            CalendarColumn::Events => row.events.to_string().into(),
            CalendarColumn::LatestUpdate => row
                .latest_update
                .map(|ms| format_ms(ms, self.tz))
                .unwrap_or_default()
                .into(),
            CalendarColumn::Status => row.status.map(status_label).unwrap_or_default().into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self.column {
            CalendarColumn::Events => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn color(&self, row: &CalendarRow) -> Option<Color> {
        if row.calendar.deleted {
            return Some(Color::BrightBlack);
        }
        match self.column {
            CalendarColumn::Marker => Some(Color::Green),
            CalendarColumn::AccessRole if !row.calendar.is_writable() => Some(Color::Yellow),
            CalendarColumn::Status if row.status == Some(SyncStatus::Failed) => Some(Color::Red),
            _ => None,
        }
    }
}
