// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use colored::Color;
use jiff::tz::TimeZone;
use mirrorcal_core::EventRecord;

use crate::table::{PaddingDirection, Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::{OutputFormat, format_time_range};

#[derive(Debug)]
pub struct EventFormatter {
    tz: TimeZone,
    columns: Vec<EventColumn>,
    format: OutputFormat,
}

impl EventFormatter {
    pub fn new(tz: TimeZone, columns: Vec<EventColumn>, format: OutputFormat) -> Self {
        Self {
            tz,
            columns,
            format,
        }
    }

    pub fn format<'a>(&'a self, events: &'a [EventRecord]) -> Display<'a> {
        Display {
            events,
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
    events: &'a [EventRecord],
    formatter: &'a EventFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.formatter.bound();
        match self.formatter.format {
            OutputFormat::Json => write!(
                f,
                "{}",
                Table::new(TableStyleJson::new(), &columns, self.events)
            ),
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(TableStyleBasic::new(), &columns, self.events)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventColumn {
    Id,
    Calendar,
    TimeRange,
    Summary,
    Schedules,
    Status,
}

impl EventColumn {
    /// Columns shown by default, `verbose` adds the calendar and status.
    pub fn defaults(verbose: bool) -> Vec<Self> {
        if verbose {
            vec![
                Self::Id,
                Self::Calendar,
                Self::TimeRange,
                Self::Status,
                Self::Schedules,
                Self::Summary,
            ]
        } else {
            vec![Self::Id, Self::TimeRange, Self::Schedules, Self::Summary]
        }
    }
}

/// A column with the zone it renders times in.
struct BoundColumn<'a> {
    column: EventColumn,
    tz: &'a TimeZone,
}

impl TableColumn<EventRecord> for BoundColumn<'_> {
    fn name(&self) -> Cow<'_, str> {
        match self.column {
            EventColumn::Id => "Id",
            EventColumn::Calendar => "Calendar",
            EventColumn::TimeRange => "Time Range",
            EventColumn::Summary => "Summary",
            EventColumn::Schedules => "Schedules",
            EventColumn::Status => "Status",
        }
        .into()
    }

    fn format<'a>(&self, event: &'a EventRecord) -> Cow<'a, str> {
        match self.column {
            EventColumn::Id => event.id.as_str().into(),
            EventColumn::Calendar => event.calendar_id.as_str().into(),
            EventColumn::TimeRange => {
                format_time_range(event.start_ms, event.end_ms, event.all_day, self.tz).into()
            }
            EventColumn::Summary => event.summary.as_deref().unwrap_or_default().into(),
            EventColumn::Schedules => event.schedules.join(",").into(),
            EventColumn::Status => event.status.as_deref().unwrap_or_default().into(),
        }
    }

    fn padding_direction(&self) -> PaddingDirection {
        match self.column {
            EventColumn::TimeRange => PaddingDirection::Right,
            _ => PaddingDirection::Left,
        }
    }

    fn color(&self, event: &EventRecord) -> Option<Color> {
        if event.is_cancelled() {
            Some(Color::BrightBlack)
        } else if self.column == EventColumn::Schedules {
            Some(Color::Cyan)
        } else {
            None
        }
    }
}
