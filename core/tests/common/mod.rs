// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! - a scripted, in-memory [`FakeRemote`] standing in for the calendar API
//! - fixtures for calendar list entries, events and pages

mod fake_remote;
mod fixtures;

#[allow(unused_imports)]
pub use fake_remote::{Call, FakeRemote};
#[allow(unused_imports)]
pub use fixtures::{
    ACCOUNT, all_day_event, api_error, calendar_entry, mirror_with, page, timed_event,
};
