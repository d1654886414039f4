// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client for the Google Calendar v3 REST API, limited to what a local mirror needs:
//! paginated, token-based listing of calendars and events, plus event insert, patch and delete.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::similar_names, clippy::single_match_else)]

mod client;
mod config;
mod error;
mod http;
mod types;

pub use crate::client::GcalClient;
pub use crate::config::{AuthMethod, GcalConfig};
pub use crate::error::GcalError;
pub use crate::types::{
    Attachment, CalendarListEntry, Event, EventDateTime, ExtendedProperties, ListRequest,
    ListResponse,
};
