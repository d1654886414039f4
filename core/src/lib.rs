// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Core of mirrorcal: a local, queryable mirror of remote calendars.
//!
//! The [`Mirror`] drives list-sync passes that copy the remote calendar list and the events of
//! each calendar into a SQLite store, announces every state change on an in-process bus, and
//! offers filtered queries and bulk edits over the mirrored events.

mod bulk;
mod bus;
mod config;
mod engine;
mod error;
mod filter;
mod localdb;
mod mirror;
mod remote;
mod resource;
mod schedule;
mod search;
mod sync_state;
mod transform;
mod types;

pub use crate::bulk::{BulkOutcome, EventKey, EventPatch, plan_replacements, prepare_draft};
pub use crate::bus::{
    DEFAULT_CAPACITY, EventBus, PageRecords, SYNC_STATE_TOPIC, Subscription, SyncChange,
    SyncNotice,
};
pub use crate::config::{APP_NAME, ApiConfig, Config, RefreshInterval, expand_path, get_config_dir};
pub use crate::engine::{ListEndpoint, ListSync, Table};
pub use crate::error::{MirrorError, TransformError};
pub use crate::filter::EventFilter;
pub use crate::localdb::{
    CALENDAR_DEFAULT, CalendarRecord, Calendars, EventRecord, Events, GOOGLE_TOKEN, LocalDb,
    SELECTED_CALENDAR_IDS, Settings, SyncStates,
};
pub use crate::mirror::{Mirror, SyncReport};
pub use crate::remote::{CalendarListEndpoint, CalendarRemote, EventsEndpoint};
pub use crate::resource::{Resource, SyncKey};
pub use crate::schedule::{SCHEDULE_MARKER, add_schedule, event_schedules, remove_schedule, schedule_key};
pub use crate::search::{ParsedSearch, default_range, parse_search_text, to_structured_text};
pub use crate::sync_state::{SyncState, SyncStatus};
pub use crate::transform::{calendar_zone, transform_calendar, transform_event};
pub use crate::types::Pager;

pub use mirrorcal_gcal as gcal;
