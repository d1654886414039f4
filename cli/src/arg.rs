// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use clap::{Arg, ArgAction, ArgMatches, arg, value_parser};
use mirrorcal_core::EventKey;

use crate::util::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn verbose() -> Arg {
        arg!(-v --verbose "Show more detailed information")
    }

    pub fn get_verbose(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }

    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CalendarArgs;

impl CalendarArgs {
    /// A single calendar the command acts on.
    pub fn calendar() -> Arg {
        arg!(-C --calendar <CALENDAR> "Calendar id, defaults to the default calendar")
    }

    pub fn get_calendar(matches: &ArgMatches) -> Option<String> {
        matches.get_one("calendar").cloned()
    }

    /// Calendars to restrict a query to, repeatable.
    pub fn calendars() -> Arg {
        arg!(-C --calendar <CALENDAR> "Only show events of this calendar, repeatable")
            .action(ArgAction::Append)
    }

    pub fn get_calendars(matches: &ArgMatches) -> Option<Vec<String>> {
        matches
            .get_many::<String>("calendar")
            .map(|ids| ids.cloned().collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EventArgs;

impl EventArgs {
    pub fn ids() -> Arg {
        arg!(ids: <EVENT> ... "Ids of the events")
    }

    pub fn get_ids(matches: &ArgMatches) -> Vec<String> {
        matches
            .get_many::<String>("ids")
            .map(|ids| ids.cloned().collect())
            .unwrap_or_default()
    }

    pub fn id() -> Arg {
        arg!(id: <EVENT> "Id of the event")
    }

    pub fn get_id(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("id")
            .cloned()
            .unwrap_or_default()
    }

    pub fn schedule() -> Arg {
        arg!(schedule: <SCHEDULE> "Name of the schedule")
    }

    pub fn get_schedule(matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("schedule")
            .cloned()
            .unwrap_or_default()
    }

    /// Builds the keys of `ids` in `calendar_id`.
    pub fn keys(calendar_id: &str, ids: &[String]) -> Vec<EventKey> {
        ids.iter()
            .map(|id| EventKey::new(calendar_id, id.as_str()))
            .collect()
    }
}
