// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod arg;
mod calendar_formatter;
mod cli;
mod cmd_calendar;
mod cmd_event;
mod cmd_generate_completion;
mod cmd_toplevel;
mod config;
mod event_formatter;
mod state_formatter;
mod table;
mod util;

pub use crate::cli::{Cli, Commands, run};
