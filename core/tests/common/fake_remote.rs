// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mirrorcal_core::CalendarRemote;
use mirrorcal_core::gcal::{CalendarListEntry, Event, GcalError, ListRequest, ListResponse};
use serde_json::Value;

type Reply<T> = Result<ListResponse<T>, GcalError>;

/// A remote call as seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListCalendars(ListRequest),
    ListEvents(String, ListRequest),
    Insert(String, Event),
    Patch(String, String, Value),
    Delete(String, String),
}

/// Answers list calls from per-resource scripts; an exhausted script answers with an empty last
/// page. Writes are recorded and succeed unless the event id was marked as failing.
#[derive(Default)]
pub struct FakeRemote {
    calendar_pages: Mutex<VecDeque<Reply<CalendarListEntry>>>,
    event_pages: Mutex<HashMap<String, VecDeque<Reply<Event>>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<Call>>,
    list_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every list call take `delay`, to observe overlapping passes.
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn push_calendar_page(&self, reply: Reply<CalendarListEntry>) {
        self.calendar_pages.lock().unwrap().push_back(reply);
    }

    pub fn push_event_page(&self, calendar_id: &str, reply: Reply<Event>) {
        self.event_pages
            .lock()
            .unwrap()
            .entry(calendar_id.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Writes to this event id fail with a server error.
    pub fn fail_writes_to(&self, event_id: &str) {
        self.failing.lock().unwrap().insert(event_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// List requests sent for one calendar.
    pub fn event_requests(&self, calendar_id: &str) -> Vec<ListRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListEvents(id, request) if id == calendar_id => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn delay(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn check_write(&self, event_id: &str) -> Result<(), GcalError> {
        if self.failing.lock().unwrap().contains(event_id) {
            return Err(GcalError::from_response(
                500,
                r#"{"error":{"code":500,"message":"Backend Error"}}"#,
            ));
        }
        Ok(())
    }
}

fn last_page<T>() -> Reply<T> {
    Ok(ListResponse {
        items: Vec::new(),
        next_page_token: None,
        next_sync_token: Some("sync-idle".to_string()),
        etag: None,
    })
}

#[async_trait]
impl CalendarRemote for FakeRemote {
    async fn list_calendars(&self, request: &ListRequest) -> Reply<CalendarListEntry> {
        self.record(Call::ListCalendars(request.clone()));
        self.delay().await;
        let reply = self.calendar_pages.lock().unwrap().pop_front();
        reply.unwrap_or_else(last_page)
    }

    async fn list_events(&self, calendar_id: &str, request: &ListRequest) -> Reply<Event> {
        self.record(Call::ListEvents(calendar_id.to_string(), request.clone()));
        self.delay().await;
        let reply = self
            .event_pages
            .lock()
            .unwrap()
            .get_mut(calendar_id)
            .and_then(VecDeque::pop_front);
        reply.unwrap_or_else(last_page)
    }

    async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<Event, GcalError> {
        self.record(Call::Insert(calendar_id.to_string(), event.clone()));
        let summary = event.summary.clone().unwrap_or_default();
        self.check_write(&summary)?;
        let mut saved = event.clone();
        saved.id = format!("new-{summary}");
        Ok(saved)
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &Value,
    ) -> Result<Event, GcalError> {
        self.record(Call::Patch(
            calendar_id.to_string(),
            event_id.to_string(),
            patch.clone(),
        ));
        self.check_write(event_id)?;
        Ok(Event {
            id: event_id.to_string(),
            ..Default::default()
        })
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GcalError> {
        self.record(Call::Delete(calendar_id.to_string(), event_id.to_string()));
        self.check_write(event_id)
    }
}
