// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for the localdb module.

use crate::localdb::{CalendarRecord, EventRecord, LocalDb};

/// Creates an in-memory test database with all migrations applied.
pub async fn setup_test_db() -> LocalDb {
    LocalDb::open(None)
        .await
        .expect("Failed to create test database")
}

/// A selected, writable calendar in UTC.
pub fn test_calendar(id: &str) -> CalendarRecord {
    CalendarRecord {
        id: id.to_string(),
        summary: id.to_string(),
        time_zone: Some("UTC".to_string()),
        access_role: Some("owner".to_string()),
        selected: true,
        raw: "{}".to_string(),
        ..Default::default()
    }
}

/// A confirmed event spanning `[start_ms, end_ms)`.
pub fn test_event(calendar_id: &str, id: &str, start_ms: i64, end_ms: i64) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        calendar_id: calendar_id.to_string(),
        status: Some("confirmed".to_string()),
        summary: Some(format!("event {id}")),
        start_ms: Some(start_ms),
        end_ms: Some(end_ms),
        raw: "{}".to_string(),
        ..Default::default()
    }
}
