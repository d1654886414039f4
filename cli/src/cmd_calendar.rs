// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use jiff::tz::TimeZone;
use mirrorcal_core::{Config, Mirror, Resource};

use crate::arg::CommonArgs;
use crate::calendar_formatter::{CalendarFormatter, CalendarRow};
use crate::util::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct CmdCalendarList {
    pub output_format: OutputFormat,
}

impl CmdCalendarList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List mirrored calendars; * marks the default, + the synced ones")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing calendars...");
        let synced = mirror.calendars_to_sync().await?;
        let default = mirror.default_calendar().await?;
        let counts = mirror.event_counts().await?;
        let latest = mirror.latest_updates().await?;
        let states = mirror.status(Some(&config.account)).await?;

        let rows: Vec<_> = mirror
            .calendars()
            .await?
            .into_iter()
            .map(|calendar| {
                let resource = Resource::Calendar(calendar.id.clone()).to_string();
                CalendarRow {
                    synced: synced.contains(&calendar.id),
                    default: default.as_deref() == Some(calendar.id.as_str()),
                    events: counts.get(&calendar.id).copied().unwrap_or(0),
                    latest_update: latest.get(&calendar.id).copied(),
                    status: states
                        .iter()
                        .find(|state| state.resource == resource)
                        .map(|state| state.status()),
                    calendar,
                }
            })
            .collect();

        if rows.is_empty() && self.output_format == OutputFormat::Table {
            println!("{}", "No calendars, run `sync` first".italic());
            return Ok(());
        }
        let formatter = CalendarFormatter::new(TimeZone::system(), self.output_format);
        println!("{}", formatter.format(&rows));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdCalendarSelect {
    pub ids: Vec<String>,
    pub default: Option<String>,
}

impl CmdCalendarSelect {
    pub const NAME: &str = "select";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Choose the calendars to sync and the default calendar")
            .arg(arg!(ids: [CALENDAR] ... "Calendars to sync"))
            .arg(arg!(-d --default <CALENDAR> "Calendar new events go to"))
            .arg_required_else_help(true)
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            ids: matches
                .get_many::<String>("ids")
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default(),
            default: matches.get_one("default").cloned(),
        }
    }

    pub async fn run(self, mirror: &Mirror, _config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "selecting calendars...");
        if !self.ids.is_empty() {
            let known: Vec<_> = mirror.calendars().await?.into_iter().map(|c| c.id).collect();
            if let Some(unknown) = self.ids.iter().find(|id| !known.contains(id)) {
                return Err(format!("Calendar not mirrored: {unknown}").into());
            }
            mirror.set_selected_calendar_ids(&self.ids).await?;
            println!("{} {} calendar(s) selected", "✓".green(), self.ids.len());
        }
        if let Some(default) = self.default {
            mirror.set_default_calendar(&default).await?;
            println!("{} default calendar is {}", "✓".green(), default.bold());
        }
        Ok(())
    }
}
