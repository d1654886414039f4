// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use mirrorcal_core::gcal::{Event, EventDateTime};
use mirrorcal_core::{EventFilter, EventKey, Mirror, MirrorError, Pager};
use serde_json::json;

use crate::common::{ACCOUNT, Call, FakeRemote, calendar_entry, mirror_with, page, timed_event};

/// A mirror holding calendar `work` (Berlin time) with events `e1` and `e2`.
async fn seeded(remote: &Arc<FakeRemote>) -> Mirror {
    remote.push_calendar_page(page(
        vec![calendar_entry("work", "Europe/Berlin")],
        None,
        Some("s"),
    ));
    remote.push_event_page(
        "work",
        page(
            vec![
                timed_event("e1", "Team sync", "2026-03-02T09:00:00Z", "2026-03-02T10:00:00Z"),
                timed_event("e2", "Lunch", "2026-03-02T12:00:00Z", "2026-03-02T13:00:00Z"),
            ],
            None,
            Some("work-sync"),
        ),
    );
    let mirror = mirror_with(remote.clone()).await;
    mirror.sync_all(ACCOUNT).await.unwrap();
    mirror
}

async fn visible_ids(mirror: &Mirror) -> Vec<String> {
    mirror
        .events(&EventFilter::default(), &Pager::ALL)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect()
}

#[tokio::test]
async fn delete_marks_events_cancelled_before_the_remote_echo() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;
    remote.fail_writes_to("e2");

    let outcome = mirror
        .delete_events(
            ACCOUNT,
            &[EventKey::new("work", "e1"), EventKey::new("work", "e2")],
        )
        .await;

    assert_eq!(outcome.succeeded, [EventKey::new("work", "e1")]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, EventKey::new("work", "e2"));
    assert!(matches!(outcome.failed[0].1, MirrorError::Remote(_)));

    assert_eq!(visible_ids(&mirror).await, ["e2"]);
    let deleted = mirror.db().events.get("work", "e1").await.unwrap().unwrap();
    assert!(deleted.is_cancelled());
    assert!(mirror.db().calendars.get("work").await.unwrap().unwrap().dirty);

    // One follow-up fetch for the touched calendar.
    assert_eq!(remote.event_requests("work").len(), 2);
}

#[tokio::test]
async fn save_completes_drafts_in_the_calendar_zone() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;
    remote.fail_writes_to("broken");

    let drafts = vec![
        Event {
            summary: Some("Planning".into()),
            start: Some(EventDateTime::date_time("2026-03-04T09:00:00", None)),
            ..Default::default()
        },
        Event {
            summary: Some("broken".into()),
            start: Some(EventDateTime::date("2026-03-05")),
            ..Default::default()
        },
    ];

    let outcome = mirror
        .save_events(ACCOUNT, "work", drafts, Some("imported"))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.succeeded[0].id, "new-Planning");
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(
        outcome.failed[0].0.end,
        Some(EventDateTime::date("2026-03-05"))
    );

    let inserted: Vec<_> = remote
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Insert(calendar, event) => Some((calendar, event)),
            _ => None,
        })
        .collect();
    assert_eq!(inserted.len(), 2);
    let (calendar, planning) = &inserted[0];
    assert_eq!(calendar, "work");
    assert_eq!(
        planning.end,
        Some(EventDateTime::date_time("2026-03-04T10:00:00+01:00", None))
    );
    assert_eq!(planning.description.as_deref(), Some("imported"));
}

#[tokio::test]
async fn save_into_an_unknown_calendar_fails() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;

    let err = mirror
        .save_events(ACCOUNT, "ghost", vec![Event::default()], None)
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::CalendarNotFound(_)));
}

#[tokio::test]
async fn tag_and_untag_send_shared_property_patches() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;
    let key = EventKey::new("work", "e1");

    mirror.tag_schedule(ACCOUNT, &key, "Swim").await.unwrap();
    mirror.untag_schedule(ACCOUNT, &key, "Swim").await.unwrap();

    let patches: Vec<_> = remote
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Patch(_, id, body) => Some((id, body)),
            _ => None,
        })
        .collect();
    assert_eq!(
        patches,
        [
            (
                "e1".to_string(),
                json!({"extendedProperties": {"shared": {"31cal/Swim": "Swim"}}})
            ),
            (
                "e1".to_string(),
                json!({"extendedProperties": {"shared": {"31cal/Swim": null}}})
            ),
        ]
    );
}

#[tokio::test]
async fn tag_reports_remote_failure() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;
    remote.fail_writes_to("e2");

    let err = mirror
        .tag_schedule(ACCOUNT, &EventKey::new("work", "e2"), "Swim")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Backend Error"));
}

#[tokio::test]
async fn replace_patches_only_matching_summaries() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;

    let outcome = mirror
        .replace_in_summaries(
            ACCOUNT,
            &EventFilter::default(),
            "team",
            Some("Crew"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome.succeeded, [EventKey::new("work", "e1")]);
    let patch = remote.calls().into_iter().find_map(|call| match call {
        Call::Patch(_, id, body) => Some((id, body)),
        _ => None,
    });
    assert_eq!(
        patch,
        Some(("e1".to_string(), json!({"summary": "Crew sync"})))
    );
}

#[tokio::test]
async fn replace_rejects_an_invalid_pattern() {
    let remote = Arc::new(FakeRemote::new());
    let mirror = seeded(&remote).await;

    let err = mirror
        .replace_in_summaries(ACCOUNT, &EventFilter::default(), "(", Some("x"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, MirrorError::Pattern(_)));
}
