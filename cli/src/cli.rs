// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, ffi::OsString, path::PathBuf, sync::Arc};

use clap::{ArgMatches, Command, ValueHint, arg, builder::styling, crate_version, value_parser};
use colored::Colorize;
use futures::{FutureExt, future::LocalBoxFuture};
use mirrorcal_core::gcal::GcalClient;
use mirrorcal_core::{APP_NAME, Config, Mirror};
use tracing_subscriber::EnvFilter;

use crate::cmd_calendar::{CmdCalendarList, CmdCalendarSelect};
use crate::cmd_event::{
    CmdEventDelete, CmdEventImport, CmdEventList, CmdEventReplace, CmdEventTag,
};
use crate::cmd_generate_completion::CmdGenerateCompletion;
use crate::cmd_toplevel::{CmdResync, CmdSchedules, CmdStatus, CmdSync};
use crate::config::parse_config;
use crate::util::OutputFormat;

/// Run the mirrorcal command-line interface.
pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    match Cli::parse() {
        Ok(cli) => {
            if let Err(e) = cli.run().await {
                println!("{} {}", "Error:".red(), e);
            }
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    };
    Ok(())
}

/// Logs go to stderr, filtered by `RUST_LOG` and `warn` by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if let Err(e) = result {
        tracing::debug!(err = %e, "tracing subscriber already set");
    }
}

/// Command-line interface
#[derive(Debug)]
pub struct Cli {
    /// Path to the configuration file
    pub config: Option<PathBuf>,

    /// The command to execute
    pub command: Commands,
}

impl Cli {
    /// Create the command-line interface
    pub fn command() -> Command {
        const STYLES: styling::Styles = styling::Styles::styled()
            .header(styling::AnsiColor::Green.on_default().bold())
            .usage(styling::AnsiColor::Green.on_default().bold())
            .literal(styling::AnsiColor::Blue.on_default().bold())
            .placeholder(styling::AnsiColor::Cyan.on_default());

        Command::new(APP_NAME)
            .about("Keep a local, queryable mirror of your remote calendars.")
            .author("Zexin Yuan <aim@yzx9.xyz>")
            .version(crate_version!())
            .styles(STYLES)
            .subcommand_required(false) // allow default to status
            .arg_required_else_help(false)
            .arg(
                arg!(-c --config [CONFIG] "Path to the configuration file")
                    .long_help(
                        "\
Path to the configuration file. Defaults to $XDG_CONFIG_HOME/mirrorcal/config.toml on Linux and \
MacOS, %LOCALAPPDATA%/mirrorcal/config.toml on Windows.",
                    )
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .subcommand(CmdSync::command())
            .subcommand(CmdStatus::command())
            .subcommand(CmdResync::command())
            .subcommand(CmdSchedules::command())
            .subcommand(
                Command::new("calendar")
                    .alias("c")
                    .about("Manage the mirrored calendars")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdCalendarList::command())
                    .subcommand(CmdCalendarSelect::command()),
            )
            .subcommand(
                Command::new("event")
                    .alias("e")
                    .about("Query and edit the mirrored events")
                    .arg_required_else_help(true)
                    .subcommand_required(true)
                    .subcommand(CmdEventList::command())
                    .subcommand(CmdEventDelete::command())
                    .subcommand(CmdEventImport::command())
                    .subcommand(CmdEventReplace::command())
                    .subcommand(CmdEventTag::command())
                    .subcommand(CmdEventTag::command_untag()),
            )
            .subcommand(CmdGenerateCompletion::command())
    }

    /// Parse the command-line arguments
    pub fn parse() -> Result<Self, Box<dyn Error>> {
        let commands = Self::command();
        let matches = commands.get_matches();
        Self::from(matches)
    }

    /// Parse the specified arguments
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, Box<dyn Error>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let commands = Self::command();
        let matches = commands.try_get_matches_from(args)?;
        Self::from(matches)
    }

    /// Create a CLI instance from the `ArgMatches`
    pub fn from(matches: ArgMatches) -> Result<Self, Box<dyn Error>> {
        use Commands::*;
        let command = match matches.subcommand() {
            Some((CmdSync::NAME, matches)) => Sync(CmdSync::from(matches)),
            Some((CmdStatus::NAME, matches)) => Status(CmdStatus::from(matches)),
            Some((CmdResync::NAME, matches)) => Resync(CmdResync::from(matches)),
            Some((CmdSchedules::NAME, matches)) => Schedules(CmdSchedules::from(matches)),
            Some(("calendar", matches)) => match matches.subcommand() {
                Some((CmdCalendarList::NAME, matches)) => {
                    CalendarList(CmdCalendarList::from(matches))
                }
                Some((CmdCalendarSelect::NAME, matches)) => {
                    CalendarSelect(CmdCalendarSelect::from(matches))
                }
                _ => unreachable!(),
            },
            Some(("event", matches)) => match matches.subcommand() {
                Some((CmdEventList::NAME, matches)) => EventList(CmdEventList::from(matches)),
                Some((CmdEventDelete::NAME, matches)) => EventDelete(CmdEventDelete::from(matches)),
                Some((CmdEventImport::NAME, matches)) => EventImport(CmdEventImport::from(matches)),
                Some((CmdEventReplace::NAME, matches)) => {
                    EventReplace(CmdEventReplace::from(matches)?)
                }
                Some((CmdEventTag::NAME, matches)) => EventTag(CmdEventTag::from(matches, false)),
                Some((CmdEventTag::NAME_UNTAG, matches)) => {
                    EventTag(CmdEventTag::from(matches, true))
                }
                _ => unreachable!(),
            },
            Some((CmdGenerateCompletion::NAME, matches)) => {
                GenerateCompletion(CmdGenerateCompletion::from(matches))
            }
            None => Status(CmdStatus {
                output_format: OutputFormat::Table,
                verbose: false,
            }),
            _ => unreachable!(),
        };

        let config = matches.get_one("config").cloned();
        Ok(Cli { config, command })
    }

    /// Run the command
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        self.command.run(self.config).await
    }
}

/// The commands available in the CLI
#[derive(Debug, Clone)]
pub enum Commands {
    /// Sync the calendar list and events
    Sync(CmdSync),

    /// Show sync states
    Status(CmdStatus),

    /// Resync a resource from scratch
    Resync(CmdResync),

    /// List schedules
    Schedules(CmdSchedules),

    /// List calendars
    CalendarList(CmdCalendarList),

    /// Select calendars to sync
    CalendarSelect(CmdCalendarSelect),

    /// List events
    EventList(CmdEventList),

    /// Delete events
    EventDelete(CmdEventDelete),

    /// Insert events from drafts
    EventImport(CmdEventImport),

    /// Search and replace in summaries
    EventReplace(CmdEventReplace),

    /// Tag or untag an event
    EventTag(CmdEventTag),

    /// Generate shell completion
    GenerateCompletion(CmdGenerateCompletion),
}

impl Commands {
    /// Run the command with the given configuration
    #[rustfmt::skip]
    pub async fn run(self, config: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
        use Commands::*;
        match self {
            Sync(a)           => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            Status(a)         => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            Resync(a)         => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            Schedules(a)      => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            CalendarList(a)   => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            CalendarSelect(a) => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            EventList(a)      => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            EventDelete(a)    => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            EventImport(a)    => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            EventReplace(a)   => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            EventTag(a)       => Self::run_with(config, |m, c| a.run(m, c).boxed_local()).await,
            GenerateCompletion(a) => a.run(),
        }
    }

    async fn run_with<F>(config: Option<PathBuf>, f: F) -> Result<(), Box<dyn Error>>
    where
        F: for<'a> FnOnce(&'a Mirror, &'a Config) -> LocalBoxFuture<'a, Result<(), Box<dyn Error>>>,
    {
        tracing::debug!("parsing configuration...");
        let config = parse_config(config).await?;
        let client = GcalClient::new(config.gcal_config())?;
        let mirror = Mirror::open(config.clone(), Arc::new(client)).await?;

        let result = f(&mirror, &config).await;

        mirror.close().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_generate_completion::Shell;

    #[test]
    fn test_parse_config() {
        let cli = Cli::try_parse_from(vec!["test", "-c", "/tmp/config.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_parse_default_status() {
        let cli = Cli::try_parse_from(vec!["test"]).unwrap();
        match cli.command {
            Commands::Status(cmd) => assert_eq!(cmd.output_format, OutputFormat::Table),
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_parse_sync() {
        let cli = Cli::try_parse_from(vec!["test", "sync", "--watch"]).unwrap();
        match cli.command {
            Commands::Sync(cmd) => assert!(cmd.watch),
            _ => panic!("Expected Sync command"),
        }
    }

    #[test]
    fn test_parse_calendar_select() {
        let cli = Cli::try_parse_from(vec!["test", "c", "select", "work", "home"]).unwrap();
        match cli.command {
            Commands::CalendarSelect(cmd) => assert_eq!(cmd.ids, ["work", "home"]),
            _ => panic!("Expected CalendarSelect command"),
        }
    }

    #[test]
    fn test_parse_event_list() {
        let args = vec!["test", "event", "list", "--output-format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::EventList(cmd) => assert_eq!(cmd.output_format, OutputFormat::Json),
            _ => panic!("Expected EventList command"),
        }
    }

    #[test]
    fn test_parse_event_untag() {
        let args = vec!["test", "e", "untag", "-C", "work", "e1", "Swim"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::EventTag(cmd) => {
                assert!(cmd.untag);
                assert_eq!(cmd.schedule, "Swim");
            }
            _ => panic!("Expected EventTag command"),
        }
    }

    #[test]
    fn test_parse_event_import() {
        let args = vec!["test", "event", "add", "-C", "work", "drafts.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::EventImport(cmd) => {
                assert_eq!(cmd.calendar.as_deref(), Some("work"));
                assert_eq!(cmd.file, Some(PathBuf::from("drafts.json")));
            }
            _ => panic!("Expected EventImport command"),
        }
    }

    #[test]
    fn test_parse_event_replace_without_action_fails() {
        assert!(Cli::try_parse_from(vec!["test", "event", "replace", "team"]).is_err());
    }

    #[test]
    fn test_parse_generate_completions() {
        let args = vec!["test", "generate-completion", "zsh"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::GenerateCompletion(cmd) => assert_eq!(cmd.shell, Shell::Zsh),
            _ => panic!("Expected GenerateCompletion command"),
        }
    }

    #[test]
    fn test_command_is_consistent() {
        Cli::command().debug_assert();
    }
}
