// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use mirrorcal_core::{
    EventFilter, MirrorError, PageRecords, Pager, Resource, SyncChange, SyncStatus,
};

use crate::common::{
    ACCOUNT, FakeRemote, api_error, calendar_entry, mirror_with, page, timed_event,
};

fn all_events() -> EventFilter {
    EventFilter {
        show_cancelled: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn sync_all_mirrors_calendars_and_their_events() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(
        vec![
            calendar_entry("work", "Europe/Berlin"),
            calendar_entry("home", "UTC"),
        ],
        None,
        Some("cal-sync-1"),
    ));
    remote.push_event_page(
        "work",
        page(
            vec![timed_event(
                "w1",
                "Standup",
                "2026-03-02T09:00:00+01:00",
                "2026-03-02T09:15:00+01:00",
            )],
            Some("p2"),
            None,
        ),
    );
    remote.push_event_page(
        "work",
        page(
            vec![timed_event(
                "w2",
                "Review",
                "2026-03-03T14:00:00+01:00",
                "2026-03-03T15:00:00+01:00",
            )],
            None,
            Some("work-sync-1"),
        ),
    );
    let mirror = mirror_with(remote.clone()).await;

    let report = mirror.sync_all(ACCOUNT).await.unwrap();

    assert_eq!(
        report.calendar_list.next_sync_token.as_deref(),
        Some("cal-sync-1")
    );
    assert_eq!(report.calendars.len(), 2);
    assert_eq!(report.failures().count(), 0);

    let calendars = mirror.calendars().await.unwrap();
    assert_eq!(calendars.len(), 2);

    let events = mirror.events(&all_events(), &Pager::ALL).await.unwrap();
    let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["w1", "w2"]);
    assert_eq!(events[0].start_ms, Some(1_772_438_400_000));

    let requests = remote.event_requests("work");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].page_token.as_deref(), Some("p2"));
}

#[tokio::test]
async fn second_pass_resumes_with_the_sync_token() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(
        vec![calendar_entry("work", "UTC")],
        None,
        Some("cal-sync-1"),
    ));
    let mirror = mirror_with(remote.clone()).await;

    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();
    let state = mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    let calls = remote.calls();
    let Some(crate::common::Call::ListCalendars(request)) = calls.last() else {
        panic!("Expected a calendar list request, got {calls:?}");
    };
    assert_eq!(request.sync_token.as_deref(), Some("cal-sync-1"));
    assert_eq!(state.status(), SyncStatus::UpToDate);
    assert_eq!(mirror.calendars().await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetching_an_unknown_calendar_fails_without_a_request() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = mirror_with(remote.clone()).await;

    let err = mirror
        .fetch_resource(ACCOUNT, &Resource::Calendar("ghost".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::CalendarNotFound(id) if id == "ghost"));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn failed_calendar_is_reported_without_stopping_the_others() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(
        vec![calendar_entry("a", "UTC"), calendar_entry("b", "UTC")],
        None,
        Some("s"),
    ));
    remote.push_event_page("a", api_error(500, "Backend Error"));
    remote.push_event_page(
        "b",
        page(
            vec![timed_event(
                "b1",
                "Lunch",
                "2026-03-02T12:00:00Z",
                "2026-03-02T13:00:00Z",
            )],
            None,
            Some("b-sync"),
        ),
    );
    let mirror = mirror_with(remote).await;

    let report = mirror.sync_all(ACCOUNT).await.unwrap();

    let failures: Vec<_> = report.failures().map(|(id, _)| id).collect();
    assert_eq!(failures, ["a"]);
    assert_eq!(mirror.count_events(&all_events()).await.unwrap(), 1);

    let states = mirror.status(Some(ACCOUNT)).await.unwrap();
    let failed = states
        .iter()
        .find(|s| s.resource == "calendar/a")
        .expect("state of calendar a");
    assert_eq!(failed.status(), SyncStatus::Failed);
    assert!(failed.error.as_deref().unwrap().contains("Backend Error"));
}

#[tokio::test]
async fn force_resync_lists_from_scratch() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("work", "UTC")], None, Some("s")));
    remote.push_event_page("work", page(Vec::new(), None, Some("work-sync-1")));
    let mirror = mirror_with(remote.clone()).await;
    mirror.sync_all(ACCOUNT).await.unwrap();

    let resource = Resource::Calendar("work".to_string());
    let state = mirror.force_resync(ACCOUNT, &resource).await.unwrap();

    let requests = remote.event_requests("work");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].sync_token, None);
    assert_eq!(requests[1].page_token, None);
    assert_eq!(state.next_sync_token.as_deref(), Some("sync-idle"));
}

#[tokio::test]
async fn expired_sync_token_restarts_the_listing() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("work", "UTC")], None, Some("s1")));
    remote.push_calendar_page(api_error(410, "Sync token is no longer valid"));
    remote.push_calendar_page(page(
        vec![calendar_entry("work", "UTC"), calendar_entry("new", "UTC")],
        None,
        Some("s2"),
    ));
    let mirror = mirror_with(remote.clone()).await;
    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    let mut notices = mirror.subscribe();
    let state = mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    assert_eq!(state.next_sync_token.as_deref(), Some("s2"));
    assert!(!state.resync_required);
    assert_eq!(mirror.calendars().await.unwrap().len(), 2);

    let mut changes = Vec::new();
    while let Some(notice) = notices.try_recv() {
        changes.push(notice.change);
    }
    assert!(changes.contains(&SyncChange::ResyncRequired));
    assert!(matches!(changes.last(), Some(SyncChange::Completed)));
}

#[tokio::test]
async fn subscribers_see_each_committed_page() {
    let remote = Arc::new(FakeRemote::new());
    remote.push_calendar_page(page(vec![calendar_entry("a", "UTC")], Some("p2"), None));
    remote.push_calendar_page(page(vec![calendar_entry("b", "UTC")], None, Some("s")));
    let mirror = mirror_with(remote).await;
    let mut notices = mirror.subscribe();

    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    let mut pages = Vec::new();
    while let Some(notice) = notices.try_recv() {
        if let SyncChange::Page(PageRecords::Calendars(records)) = notice.change {
            assert_eq!(notice.current.resource, "calendarList");
            pages.push(records.into_iter().map(|c| c.id).collect::<Vec<_>>());
        }
    }
    assert_eq!(pages, [vec!["a".to_string()], vec!["b".to_string()]]);
}

#[tokio::test]
async fn passes_over_one_resource_never_overlap() {
    let remote = Arc::new(FakeRemote::new().with_list_delay(Duration::from_millis(20)));
    let mirror = mirror_with(remote.clone()).await;

    let (first, second) = tokio::join!(
        mirror.fetch_calendar_list(ACCOUNT),
        mirror.fetch_calendar_list(ACCOUNT),
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(remote.max_in_flight(), 1);
}

#[tokio::test]
async fn passes_over_distinct_calendars_run_concurrently() {
    let remote = Arc::new(FakeRemote::new().with_list_delay(Duration::from_millis(50)));
    remote.push_calendar_page(page(
        vec![calendar_entry("a", "UTC"), calendar_entry("b", "UTC")],
        None,
        Some("s"),
    ));
    let mirror = mirror_with(remote.clone()).await;
    mirror.fetch_calendar_list(ACCOUNT).await.unwrap();

    let results = mirror
        .fetch_events(ACCOUNT, &["a".to_string(), "b".to_string()])
        .await;

    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(remote.max_in_flight(), 2);
}

#[tokio::test]
async fn pass_locks_are_released_with_the_last_waiter() {
    let remote = Arc::new(FakeRemote::new().with_list_delay(Duration::from_millis(50)));
    let mirror = mirror_with(remote).await;

    let (first, second, active) = tokio::join!(
        mirror.fetch_calendar_list(ACCOUNT),
        mirror.fetch_calendar_list(ACCOUNT),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            mirror.active_keys()
        },
    );

    first.unwrap();
    second.unwrap();
    assert_eq!(active, 1);
    assert_eq!(mirror.active_keys(), 0);

    mirror
        .force_resync(ACCOUNT, &Resource::CalendarList)
        .await
        .unwrap();
    assert_eq!(mirror.active_keys(), 0);
}
