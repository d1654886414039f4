// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use mirrorcal_gcal::{
    CalendarListEntry, Event, GcalClient, GcalError, ListRequest, ListResponse,
};
use serde_json::Value;

use crate::engine::ListEndpoint;

/// The remote calendar API as used by the mirror.
#[async_trait]
pub trait CalendarRemote: Send + Sync {
    async fn list_calendars(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<CalendarListEntry>, GcalError>;

    async fn list_events(
        &self,
        calendar_id: &str,
        request: &ListRequest,
    ) -> Result<ListResponse<Event>, GcalError>;

    async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<Event, GcalError>;

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &Value,
    ) -> Result<Event, GcalError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GcalError>;
}

#[async_trait]
impl CalendarRemote for GcalClient {
    async fn list_calendars(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<CalendarListEntry>, GcalError> {
        GcalClient::list_calendars(self, request).await
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        request: &ListRequest,
    ) -> Result<ListResponse<Event>, GcalError> {
        GcalClient::list_events(self, calendar_id, request).await
    }

    async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<Event, GcalError> {
        GcalClient::insert_event(self, calendar_id, event).await
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &Value,
    ) -> Result<Event, GcalError> {
        GcalClient::patch_event(self, calendar_id, event_id, patch).await
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GcalError> {
        GcalClient::delete_event(self, calendar_id, event_id).await
    }
}

/// Lists the user's calendar list.
pub struct CalendarListEndpoint<'a> {
    remote: &'a dyn CalendarRemote,
}

impl<'a> CalendarListEndpoint<'a> {
    pub fn new(remote: &'a dyn CalendarRemote) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl<'a> ListEndpoint for CalendarListEndpoint<'a> {
    type Item = CalendarListEntry;

    async fn list(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<CalendarListEntry>, GcalError> {
        self.remote.list_calendars(request).await
    }
}

/// Lists the events of one calendar.
pub struct EventsEndpoint<'a> {
    remote: &'a dyn CalendarRemote,
    calendar_id: &'a str,
}

impl<'a> EventsEndpoint<'a> {
    pub fn new(remote: &'a dyn CalendarRemote, calendar_id: &'a str) -> Self {
        Self {
            remote,
            calendar_id,
        }
    }

    /// First-page query: deleted events are listed so cancellations reach the mirror, and
    /// recurring events are expanded into instances.
    pub fn base_request() -> ListRequest {
        ListRequest::new()
            .param("showDeleted", "true")
            .param("singleEvents", "true")
    }
}

#[async_trait]
impl<'a> ListEndpoint for EventsEndpoint<'a> {
    type Item = Event;

    async fn list(&self, request: &ListRequest) -> Result<ListResponse<Event>, GcalError> {
        self.remote.list_events(self.calendar_id, request).await
    }
}
