// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::pin::pin;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, OptionFuture};
use jiff::tz::TimeZone;
use mirrorcal_core::{Config, Mirror, MirrorError, Resource, SyncChange, SyncNotice, SyncReport};
use tokio::time::MissedTickBehavior;

use crate::arg::{CalendarArgs, CommonArgs};
use crate::state_formatter::StateFormatter;
use crate::util::OutputFormat;

#[derive(Debug, Clone, Copy)]
pub struct CmdSync {
    pub watch: bool,
    pub verbose: bool,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Fetch the calendar list and the events of every synced calendar")
            .arg(arg!(-w --watch "Keep syncing at the configured refresh interval"))
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            watch: matches.get_flag("watch"),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "syncing...");
        let report = mirror.sync_all(&config.account).await?;
        print_report(&report, self.verbose);
        if !self.watch {
            return Ok(());
        }

        self.keep_syncing(mirror, config, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(err = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Syncs at the refresh interval until `shutdown` completes, which also drops a running pass.
    async fn keep_syncing(
        self,
        mirror: &Mirror,
        config: &Config,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), Box<dyn Error>> {
        let interval = config.refresh_interval.0;
        println!(
            "Watching, next pass in {}s. Press Ctrl-C to stop.",
            interval.as_secs()
        );
        let mut notices = mirror.subscribe();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // the first tick completes immediately

        let mut shutdown = pin!(shutdown);
        let mut pass: Option<LocalBoxFuture<'_, Result<SyncReport, MirrorError>>> = None;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(running = pass.is_some(), "interrupted, stopping watch");
                    return Ok(());
                }
                _ = ticker.tick(), if pass.is_none() => {
                    pass = Some(mirror.sync_all(&config.account).boxed_local());
                }
                Some(result) = OptionFuture::from(pass.as_mut()), if pass.is_some() => {
                    pass = None;
                    match result {
                        Ok(report) => print_report(&report, self.verbose),
                        Err(e) => println!("{} {}", "Error:".red(), e),
                    }
                }
                Some(notice) = notices.recv() => {
                    if self.verbose {
                        print_notice(&notice);
                    }
                }
            }
        }
    }
}

fn print_report(report: &SyncReport, verbose: bool) {
    let failures: Vec<_> = report.failures().collect();
    let synced = report.calendars.len() - failures.len();
    println!(
        "{} {} calendar(s) synced",
        "✓".green(),
        synced.to_string().bold()
    );
    if verbose {
        for (id, result) in &report.calendars {
            if let Ok(state) = result {
                println!("  {id} {}", state.next_sync_token.as_deref().unwrap_or("-"));
            }
        }
    }
    for (id, err) in failures {
        println!("{} {}: {}", "✗".red(), id, err);
    }
}

fn print_notice(notice: &SyncNotice) {
    let resource = &notice.current.resource;
    match &notice.change {
        SyncChange::Page(records) => println!("  {resource}: {} record(s)", records.len()),
        SyncChange::ResyncRequired => println!("  {resource}: {}", "full resync".yellow()),
        SyncChange::Failed { error } => println!("  {resource}: {}", error.red()),
        SyncChange::Requesting | SyncChange::Completed => {}
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdStatus {
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show the sync state of every mirrored resource")
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing sync states...");
        let account = (!self.verbose).then_some(config.account.as_str());
        let states = mirror.status(account).await?;
        if states.is_empty() && self.output_format == OutputFormat::Table {
            println!("{}", "Never synced, run `sync` first".italic());
            return Ok(());
        }

        let formatter = StateFormatter::new(TimeZone::system(), self.output_format, self.verbose);
        println!("{}", formatter.format(&states));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CmdSchedules {
    pub output_format: OutputFormat,
}

impl CmdSchedules {
    pub const NAME: &str = "schedules";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("List the schedules events are tagged with")
            .arg(CommonArgs::output_format())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, _config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing schedules...");
        let schedules = mirror.schedules().await?;
        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schedules)?),
            OutputFormat::Table => {
                for schedule in schedules {
                    println!("{schedule}");
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdResync {
    pub calendar: Option<String>,
}

impl CmdResync {
    pub const NAME: &str = "resync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Drop the sync token of a resource and list it from scratch")
            .long_about(
                "\
Drop the sync token of a resource and list it from scratch. Without --calendar the calendar \
list is resynced.",
            )
            .arg(arg!(-C --calendar <CALENDAR> "Calendar whose events are resynced"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar: CalendarArgs::get_calendar(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "resyncing...");
        let resource = match self.calendar {
            Some(id) => Resource::Calendar(id),
            None => Resource::CalendarList,
        };
        let state = mirror.force_resync(&config.account, &resource).await?;
        println!("{} {} resynced", "✓".green(), state.resource.bold());
        Ok(())
    }
}
