// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint, arg, value_parser};
use colored::Colorize;
use jiff::Zoned;
use mirrorcal_core::gcal::Event;
use mirrorcal_core::{
    BulkOutcome, Config, EventFilter, EventKey, Mirror, Pager, parse_search_text,
    to_structured_text,
};
use tokio::io::AsyncReadExt;

use crate::arg::{CalendarArgs, CommonArgs, EventArgs};
use crate::event_formatter::{EventColumn, EventFormatter};
use crate::util::OutputFormat;

/// Query options shared by the commands that select events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    pub search: Option<String>,
    pub calendars: Option<Vec<String>>,
    pub schedules: Vec<String>,
    pub text: Option<String>,
    pub cancelled: bool,
}

impl FilterArgs {
    fn args(search_positional: bool) -> Vec<Arg> {
        let search = if search_positional {
            arg!(search: [SEARCH] "Structured search, e.g. 'start:2026-03-01 end-of:2026-03' or '2026'")
        } else {
            arg!(search: -q --search <SEARCH> "Structured search, e.g. 'start:2026-03-01 end-of:2026-03'")
        };
        vec![
            search,
            CalendarArgs::calendars(),
            arg!(-s --schedule <SCHEDULE> "Only events tagged with this schedule, repeatable")
                .action(ArgAction::Append),
            arg!(-t --text <TEXT> "Only events whose summary, description or location contain this"),
            arg!(--cancelled "Include cancelled events"),
        ]
    }

    fn from(matches: &ArgMatches) -> Self {
        Self {
            search: matches.get_one("search").cloned(),
            calendars: CalendarArgs::get_calendars(matches),
            schedules: matches
                .get_many::<String>("schedule")
                .map(|s| s.cloned().collect())
                .unwrap_or_default(),
            text: matches.get_one("text").cloned(),
            cancelled: matches.get_flag("cancelled"),
        }
    }

    /// Builds the filter, from now onwards unless the search gives both bounds.
    async fn filter(&self, mirror: &Mirror, now: &Zoned) -> Result<EventFilter, Box<dyn Error>> {
        let mut filter = EventFilter::default_window(now);
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let parsed = parse_search_text(search, now);
            if parsed.is_empty() {
                return Err(format!("Unrecognized search: {search}").into());
            }
            tracing::debug!(search = %to_structured_text(&parsed, now), "applying search");
            filter.apply_search(&parsed);
        }

        filter.calendar_ids = match &self.calendars {
            Some(ids) => Some(ids.clone()),
            None => Some(mirror.calendars_to_sync().await?),
        };
        filter.schedules = self.schedules.clone();
        filter.text = self.text.clone();
        filter.show_cancelled = self.cancelled;
        Ok(filter)
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventList {
    pub filter: FilterArgs,
    pub limit: i64,
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CmdEventList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List mirrored events, from now to the end of next month by default")
            .args(FilterArgs::args(true))
            .arg(
                arg!(-n --limit <LIMIT> "Maximum number of events to show")
                    .value_parser(value_parser!(i64).range(1..))
                    .default_value("64"),
            )
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            filter: FilterArgs::from(matches),
            limit: matches.get_one("limit").copied().unwrap_or(64),
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, _config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing events...");
        let now = Zoned::now();
        let filter = self.filter.filter(mirror, &now).await?;

        let pager: Pager = (self.limit, 0).into();
        let events = mirror.events(&filter, &pager).await?;
        if events.len() as i64 >= self.limit {
            let total = mirror.count_events(&filter).await?;
            if total > self.limit {
                println!("Displaying the {}/{total} events", self.limit);
            }
        }

        let columns = EventColumn::defaults(self.verbose);
        let formatter = EventFormatter::new(now.time_zone().clone(), columns, self.output_format);
        println!("{}", formatter.format(&events));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventDelete {
    pub calendar: Option<String>,
    pub ids: Vec<String>,
}

impl CmdEventDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete events remotely and mark them cancelled in the mirror")
            .arg(CalendarArgs::calendar())
            .arg(EventArgs::ids())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar: CalendarArgs::get_calendar(matches),
            ids: EventArgs::get_ids(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting events...");
        let calendar = resolve_calendar(mirror, self.calendar).await?;
        let keys = EventArgs::keys(&calendar, &self.ids);
        let outcome = mirror.delete_events(&config.account, &keys).await;
        print_outcome("deleted", &outcome, |key| key.event_id.clone())
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventReplace {
    pub pattern: String,
    pub replacement: Option<String>,
    pub attachment: Option<String>,
    pub filter: FilterArgs,
}

impl CmdEventReplace {
    pub const NAME: &str = "replace";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Search and replace in the summaries of the selected events")
            .long_about(
                "\
Search and replace in the summaries of the selected events. PATTERN is a case-insensitive \
regular expression, only its first match in each summary is replaced. With --attach, a link is \
appended to the attachments of every matching event.",
            )
            .arg(arg!(pattern: <PATTERN> "Regular expression to search for"))
            .arg(arg!(replacement: [REPLACEMENT] "Replacement, `$1` refers to a capture group"))
            .arg(arg!(--attach <URL> "Attach this link to every matching event"))
            .args(FilterArgs::args(false))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let replacement: Option<String> = matches.get_one("replacement").cloned();
        let attachment: Option<String> = matches.get_one("attach").cloned();
        if replacement.is_none() && attachment.is_none() {
            return Err("Nothing to do, give a replacement or --attach".into());
        }

        Ok(Self {
            pattern: matches
                .get_one::<String>("pattern")
                .cloned()
                .unwrap_or_default(),
            replacement,
            attachment,
            filter: FilterArgs::from(matches),
        })
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "replacing in summaries...");
        let filter = self.filter.filter(mirror, &Zoned::now()).await?;
        let outcome = mirror
            .replace_in_summaries(
                &config.account,
                &filter,
                &self.pattern,
                self.replacement.as_deref(),
                self.attachment.as_deref(),
            )
            .await?;
        print_outcome("updated", &outcome, |key| key.event_id.clone())
    }
}

/// Inserts events from a JSON array of drafts.
#[derive(Debug, Clone)]
pub struct CmdEventImport {
    pub calendar: Option<String>,
    pub file: Option<PathBuf>,
    pub description: Option<String>,
}

impl CmdEventImport {
    pub const NAME: &str = "import";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("add")
            .about("Insert events from a JSON array of drafts")
            .long_about(
                "\
Insert events from a JSON array of drafts, read from FILE or from stdin when FILE is omitted or \
`-`. Each draft uses the remote event format. A timed draft without end lasts one hour, an \
all-day draft without end lasts its start day.",
            )
            .arg(CalendarArgs::calendar())
            .arg(
                arg!(file: [FILE] "JSON file with the drafts")
                    .value_parser(value_parser!(PathBuf))
                    .value_hint(ValueHint::FilePath),
            )
            .arg(arg!(-d --description <DESCRIPTION> "Description of drafts that have none"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            calendar: CalendarArgs::get_calendar(matches),
            file: matches
                .get_one::<PathBuf>("file")
                .filter(|path| path.as_os_str() != "-")
                .cloned(),
            description: matches.get_one("description").cloned(),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "importing events...");
        let text = match &self.file {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => {
                let mut text = String::new();
                tokio::io::stdin().read_to_string(&mut text).await?;
                text
            }
        };
        let drafts = parse_drafts(&text)?;
        let calendar = resolve_calendar(mirror, self.calendar).await?;
        let outcome = mirror
            .save_events(
                &config.account,
                &calendar,
                drafts,
                self.description.as_deref(),
            )
            .await?;
        print_outcome("saved", &outcome, draft_label)
    }
}

fn parse_drafts(text: &str) -> Result<Vec<Event>, Box<dyn Error>> {
    let drafts: Vec<Event> =
        serde_json::from_str(text).map_err(|e| format!("Invalid event drafts: {e}"))?;
    if drafts.is_empty() {
        return Err("No event drafts given".into());
    }
    Ok(drafts)
}

fn draft_label(event: &Event) -> String {
    match (&event.summary, event.id.as_str()) {
        (Some(summary), _) => summary.clone(),
        (None, "") => "(untitled)".to_string(),
        (None, id) => id.to_string(),
    }
}

/// Adds or removes a schedule tag.
#[derive(Debug, Clone)]
pub struct CmdEventTag {
    pub untag: bool,
    pub calendar: Option<String>,
    pub id: String,
    pub schedule: String,
}

impl CmdEventTag {
    pub const NAME: &str = "tag";
    pub const NAME_UNTAG: &str = "untag";

    pub fn command() -> Command {
        Self::build(Self::NAME, "Tag an event with a schedule")
    }

    pub fn command_untag() -> Command {
        Self::build(Self::NAME_UNTAG, "Remove a schedule tag from an event")
    }

    fn build(name: &'static str, about: &'static str) -> Command {
        Command::new(name)
            .about(about)
            .arg(CalendarArgs::calendar())
            .arg(EventArgs::id())
            .arg(EventArgs::schedule())
    }

    pub fn from(matches: &ArgMatches, untag: bool) -> Self {
        Self {
            untag,
            calendar: CalendarArgs::get_calendar(matches),
            id: EventArgs::get_id(matches),
            schedule: EventArgs::get_schedule(matches),
        }
    }

    pub async fn run(self, mirror: &Mirror, config: &Config) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "tagging event...");
        let calendar = resolve_calendar(mirror, self.calendar).await?;
        let key = EventKey::new(calendar, self.id);
        if self.untag {
            mirror
                .untag_schedule(&config.account, &key, &self.schedule)
                .await?;
            println!("{} {} untagged {}", "✓".green(), key.event_id, self.schedule);
        } else {
            mirror
                .tag_schedule(&config.account, &key, &self.schedule)
                .await?;
            println!("{} {} tagged {}", "✓".green(), key.event_id, self.schedule.cyan());
        }
        Ok(())
    }
}

/// The given calendar, or the default one.
async fn resolve_calendar(
    mirror: &Mirror,
    calendar: Option<String>,
) -> Result<String, Box<dyn Error>> {
    match calendar {
        Some(calendar) => Ok(calendar),
        None => mirror
            .default_calendar()
            .await?
            .ok_or_else(|| "No calendar given and no default calendar set".into()),
    }
}

fn print_outcome<T>(
    verb: &str,
    outcome: &BulkOutcome<T>,
    label: impl Fn(&T) -> String,
) -> Result<(), Box<dyn Error>> {
    println!(
        "{} {} event(s) {verb}",
        "✓".green(),
        outcome.succeeded.len().to_string().bold()
    );
    for (item, err) in &outcome.failed {
        println!("{} {}: {}", "✗".red(), label(item), err);
    }
    if outcome.is_complete() {
        Ok(())
    } else {
        Err(format!("{} event(s) failed", outcome.failed.len()).into())
    }
}
