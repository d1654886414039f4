// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use mirrorcal_core::gcal::{
    CalendarListEntry, Event, EventDateTime, GcalError, ListResponse,
};
use mirrorcal_core::{EventBus, LocalDb, Mirror};

use crate::common::FakeRemote;

pub const ACCOUNT: &str = "me@example.com";

/// A mirror over an in-memory store and the given fake.
pub async fn mirror_with(remote: Arc<FakeRemote>) -> Mirror {
    let db = LocalDb::open(None)
        .await
        .expect("Failed to create test database");
    Mirror::new(db, remote, EventBus::default())
}

pub fn calendar_entry(id: &str, time_zone: &str) -> CalendarListEntry {
    CalendarListEntry {
        id: id.to_string(),
        summary: Some(id.to_string()),
        time_zone: Some(time_zone.to_string()),
        access_role: Some("owner".to_string()),
        selected: true,
        ..Default::default()
    }
}

pub fn timed_event(id: &str, summary: &str, start: &str, end: &str) -> Event {
    Event {
        id: id.to_string(),
        status: Some("confirmed".to_string()),
        summary: Some(summary.to_string()),
        start: Some(EventDateTime::date_time(start, None)),
        end: Some(EventDateTime::date_time(end, None)),
        updated: Some("2026-01-01T00:00:00Z".to_string()),
        ..Default::default()
    }
}

pub fn all_day_event(id: &str, summary: &str, start: &str, end: &str) -> Event {
    Event {
        id: id.to_string(),
        status: Some("confirmed".to_string()),
        summary: Some(summary.to_string()),
        start: Some(EventDateTime::date(start)),
        end: Some(EventDateTime::date(end)),
        ..Default::default()
    }
}

pub fn page<T>(items: Vec<T>, next_page: Option<&str>, next_sync: Option<&str>) -> Result<ListResponse<T>, GcalError> {
    Ok(ListResponse {
        items,
        next_page_token: next_page.map(ToString::to_string),
        next_sync_token: next_sync.map(ToString::to_string),
        etag: None,
    })
}

pub fn api_error<T>(status: u16, message: &str) -> Result<ListResponse<T>, GcalError> {
    let body = serde_json::json!({"error": {"code": status, "message": message}});
    Err(GcalError::from_response(status, &body.to_string()))
}
