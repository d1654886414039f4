// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use mirrorcal_core::gcal::ExtendedProperties;
use mirrorcal_core::{Config, EventFilter, Mirror, MirrorError, Pager, SyncStatus};
use tempfile::TempDir;

use crate::common::{
    ACCOUNT, FakeRemote, all_day_event, calendar_entry, mirror_with, page, timed_event,
};

fn tagged(id: &str, schedule: &str) -> mirrorcal_core::gcal::Event {
    let mut event = timed_event(id, id, "2026-03-02T09:00:00Z", "2026-03-02T10:00:00Z");
    event.extended_properties = Some(ExtendedProperties {
        shared: BTreeMap::from([(format!("31cal/{schedule}"), schedule.to_string())]),
        ..Default::default()
    });
    event
}

#[tokio::test]
async fn selection_limits_the_calendars_to_sync() {
    let remote = Arc::new(FakeRemote::new());
    let mut hidden = calendar_entry("hidden", "UTC");
    hidden.selected = false;
    remote.push_calendar_page(page(
        vec![
            calendar_entry("a", "UTC"),
            calendar_entry("b", "UTC"),
            hidden,
        ],
        None,
        Some("s"),
    ));
    let mirror = mirror_with(remote.clone()).await;
    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    assert_eq!(mirror.selected_calendar_ids().await.unwrap(), None);
    assert_eq!(mirror.calendars_to_sync().await.unwrap(), ["a", "b"]);

    mirror
        .set_selected_calendar_ids(&["b".to_string()])
        .await
        .unwrap();
    assert_eq!(
        mirror.selected_calendar_ids().await.unwrap(),
        Some(vec!["b".to_string()])
    );

    let report = mirror.sync_all(ACCOUNT).await.unwrap();
    let synced: Vec<_> = report.calendars.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(synced, ["b"]);
    assert!(remote.event_requests("a").is_empty());
}

#[tokio::test]
async fn default_calendar_must_be_mirrored() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("a", "UTC")], None, Some("s")));
    let mirror = mirror_with(remote).await;
    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    let err = mirror.set_default_calendar("ghost").await.unwrap_err();
    assert!(matches!(err, MirrorError::CalendarNotFound(_)));
    assert_eq!(mirror.default_calendar().await.unwrap(), None);

    mirror.set_default_calendar("a").await.unwrap();
    assert_eq!(mirror.default_calendar().await.unwrap().as_deref(), Some("a"));
}

#[tokio::test]
async fn schedules_and_schedule_filter_follow_the_tags() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("a", "UTC")], None, Some("s")));
    remote.push_event_page(
        "a",
        page(
            vec![tagged("e1", "Swim"), tagged("e2", "Gym"), tagged("e3", "Swim")],
            None,
            Some("a-sync"),
        ),
    );
    let mirror = mirror_with(remote).await;
    mirror.sync_all(ACCOUNT).await.unwrap();

    assert_eq!(mirror.schedules().await.unwrap(), ["Gym", "Swim"]);

    let filter = EventFilter {
        schedules: vec!["Swim".to_string()],
        ..Default::default()
    };
    let ids: Vec<_> = mirror
        .events(&filter, &Pager::ALL)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, ["e1", "e3"]);
    assert_eq!(mirror.count_events(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn status_lists_every_fetched_resource() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("a", "UTC")], None, Some("s")));
    let mirror = mirror_with(remote).await;
    assert!(mirror.status(None).await.unwrap().is_empty());

    mirror.sync_all(ACCOUNT).await.unwrap();

    let states = mirror.status(Some(ACCOUNT)).await.unwrap();
    let resources: Vec<_> = states.iter().map(|s| s.resource.as_str()).collect();
    assert_eq!(resources, ["calendar/a", "calendarList"]);
    assert!(states.iter().all(|s| s.status() == SyncStatus::UpToDate));
    assert!(mirror.status(Some("other@example.com")).await.unwrap().is_empty());
}

#[tokio::test]
async fn reopened_store_keeps_the_mirror() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::new(ACCOUNT);
    config.state_dir = Some(dir.path().join("state"));

    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("a", "UTC")], None, Some("s")));
    let mirror = Mirror::open(config.clone(), remote.clone()).await.unwrap();
    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();
    drop(mirror);

    assert!(dir.path().join("state").join("mirror.db").exists());
    let reopened = Mirror::open(config, Arc::new(FakeRemote::new())).await.unwrap();
    assert_eq!(reopened.calendars().await.unwrap().len(), 1);
    assert_eq!(reopened.status(Some(ACCOUNT)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn open_rejects_an_empty_account() {
    let err = Mirror::open(Config::new(" "), Arc::new(FakeRemote::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, MirrorError::Config(_)));
}

#[tokio::test]
async fn counts_and_latest_updates_per_calendar() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(
        vec![calendar_entry("a", "UTC"), calendar_entry("b", "UTC")],
        None,
        Some("s"),
    ));
    let mut cancelled =
        timed_event("e2", "Dropped", "2026-03-03T09:00:00Z", "2026-03-03T10:00:00Z");
    cancelled.status = Some("cancelled".to_string());
    cancelled.updated = Some("2026-02-01T00:00:00Z".to_string());
    remote.push_event_page(
        "a",
        page(
            vec![
                timed_event("e1", "Kept", "2026-03-02T09:00:00Z", "2026-03-02T10:00:00Z"),
                cancelled,
            ],
            None,
            Some("sa"),
        ),
    );
    remote.push_event_page(
        "b",
        page(
            vec![all_day_event("e3", "Holiday", "2026-03-05", "2026-03-06")],
            None,
            Some("sb"),
        ),
    );
    let mirror = mirror_with(remote).await;
    mirror.sync_all(ACCOUNT).await.unwrap();

    let counts = mirror.event_counts().await.unwrap();
    assert_eq!(counts.get("a"), Some(&1));
    assert_eq!(counts.get("b"), Some(&1));

    let latest = mirror.latest_updates().await.unwrap();
    assert_eq!(latest.get("a"), Some(&1_769_904_000_000));
    assert_eq!(latest.get("b"), None);
}
