// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Remote calendar API client.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::config::GcalConfig;
use crate::error::GcalError;
use crate::http::HttpClient;
use crate::types::{CalendarListEntry, Event, ListRequest, ListResponse};

/// Client for the calendar list and event collections of one authenticated user.
///
/// # Example
///
/// ```ignore
/// use mirrorcal_gcal::{AuthMethod, GcalClient, GcalConfig, ListRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GcalConfig {
///     auth: AuthMethod::Bearer { token: "ya29...".to_string() },
///     ..Default::default()
/// };
///
/// let client = GcalClient::new(config)?;
/// let page = client.list_calendars(&ListRequest::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GcalClient {
    http: Arc<HttpClient>,
    config: GcalConfig,
}

impl GcalClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(config: GcalConfig) -> Result<Self, GcalError> {
        if config.base_url.is_empty() {
            return Err(GcalError::Config("base_url must not be empty".to_string()));
        }

        let http = HttpClient::new(config.clone())?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    /// Lists one page of the user's calendar list.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails; a stale sync token yields status 410.
    pub async fn list_calendars(
        &self,
        request: &ListRequest,
    ) -> Result<ListResponse<CalendarListEntry>, GcalError> {
        let url = self.full_url("/users/me/calendarList");
        tracing::debug!(%url, ?request, "listing calendars");

        self.http
            .execute_json(
                self.http
                    .build_request(Method::GET, &url)
                    .query(&request.query()),
            )
            .await
    }

    /// Lists one page of the events of a calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails; a stale sync token yields status 410.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        request: &ListRequest,
    ) -> Result<ListResponse<Event>, GcalError> {
        let url = self.events_url(calendar_id);
        tracing::debug!(%url, ?request, "listing events");

        self.http
            .execute_json(
                self.http
                    .build_request(Method::GET, &url)
                    .query(&request.query()),
            )
            .await
    }

    /// Inserts a new event and returns it as stored by the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails.
    pub async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<Event, GcalError> {
        let url = self.events_url(calendar_id);

        self.http
            .execute_json(self.http.build_request(Method::POST, &url).json(event))
            .await
    }

    /// Applies a partial update to an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &Value,
    ) -> Result<Event, GcalError> {
        let url = self.event_url(calendar_id, event_id);

        self.http
            .execute_json(
                self.http
                    .build_request(Method::PATCH, &url)
                    .query(&[("supportsAttachments", "true")])
                    .json(patch),
            )
            .await
    }

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), GcalError> {
        let url = self.event_url(calendar_id, event_id);

        self.http
            .execute(self.http.build_request(Method::DELETE, &url))
            .await?;

        Ok(())
    }

    fn events_url(&self, calendar_id: &str) -> String {
        let calendar_id = urlencoding::encode(calendar_id);
        self.full_url(&format!("/calendars/{calendar_id}/events"))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        let event_id = urlencoding::encode(event_id);
        format!("{}/{event_id}", self.events_url(calendar_id))
    }

    fn full_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}
