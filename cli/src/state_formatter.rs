// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt};

use colored::Color;
use jiff::tz::TimeZone;
use mirrorcal_core::{SyncState, SyncStatus};

use crate::table::{Table, TableColumn, TableStyleBasic, TableStyleJson};
use crate::util::{OutputFormat, format_ms};

#[derive(Debug)]
pub struct StateFormatter {
    tz: TimeZone,
    format: OutputFormat,
    verbose: bool,
}

impl StateFormatter {
    pub fn new(tz: TimeZone, format: OutputFormat, verbose: bool) -> Self {
        Self {
            tz,
            format,
            verbose,
        }
    }

    pub fn format<'a>(&'a self, states: &'a [SyncState]) -> Display<'a> {
        Display {
            states,
            formatter: self,
        }
    }

    fn columns(&self) -> Vec<StateColumn<'_>> {
        let mut kinds = vec![StateKind::Resource, StateKind::Status, StateKind::Updated];
        if self.verbose {
            kinds.insert(0, StateKind::Account);
            kinds.push(StateKind::SyncToken);
        }
        kinds.push(StateKind::Error);
        kinds
            .into_iter()
            .map(|kind| StateColumn { kind, tz: &self.tz })
            .collect()
    }
}

#[derive(Debug)]
pub struct Display<'a> {
    states: &'a [SyncState],
    formatter: &'a StateFormatter,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.formatter.columns();
        match self.formatter.format {
            OutputFormat::Json => write!(
                f,
                "{}",
                Table::new(TableStyleJson::new(), &columns, self.states)
            ),
            OutputFormat::Table => write!(
                f,
                "{}",
                Table::new(TableStyleBasic::new(), &columns, self.states)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateKind {
    Account,
    Resource,
    Status,
    Updated,
    SyncToken,
    Error,
}

struct StateColumn<'a> {
    kind: StateKind,
    tz: &'a TimeZone,
}

impl TableColumn<SyncState> for StateColumn<'_> {
    fn name(&self) -> Cow<'_, str> {
        match self.kind {
            StateKind::Account => "Account",
            StateKind::Resource => "Resource",
            StateKind::Status => "Status",
            StateKind::Updated => "Updated",
            StateKind::SyncToken => "Sync Token",
            StateKind::Error => "Error",
        }
        .into()
    }

    fn format<'a>(&self, state: &'a SyncState) -> Cow<'a, str> {
        match self.kind {
            StateKind::Account => state.account.as_str().into(),
            StateKind::Resource => state.resource.as_str().into(),
            StateKind::Status => status_label(state.status()).into(),
            StateKind::Updated => state
                .updated_at
                .map(|ms| format_ms(ms, self.tz))
                .unwrap_or_default()
                .into(),
            StateKind::SyncToken => state.next_sync_token.as_deref().unwrap_or_default().into(),
            StateKind::Error => state.error.as_deref().unwrap_or_default().into(),
        }
    }

    fn color(&self, state: &SyncState) -> Option<Color> {
        match (self.kind, state.status()) {
            (StateKind::Status | StateKind::Error, SyncStatus::Failed) => Some(Color::Red),
            (StateKind::Status, SyncStatus::Requesting) => Some(Color::Yellow),
            (StateKind::Status, SyncStatus::UpToDate) => Some(Color::Green),
            _ => None,
        }
    }
}

pub fn status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Never => "never",
        SyncStatus::Requesting => "requesting",
        SyncStatus::Failed => "failed",
        SyncStatus::UpToDate => "up to date",
    }
}
