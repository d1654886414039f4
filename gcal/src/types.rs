// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query of one list call.
///
/// `page_token` walks the pages of one listing pass, `sync_token` asks only for changes since
/// the pass that produced it. `params` holds the resource specific filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Cursor for the next page within one listing pass.
    pub page_token: Option<String>,
    /// Cursor for incremental listing.
    pub sync_token: Option<String>,
    /// Resource specific query parameters.
    pub params: Vec<(String, String)>,
}

impl ListRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Returns a copy seeded with the given cursors.
    #[must_use]
    pub fn with_cursors(&self, page_token: Option<String>, sync_token: Option<String>) -> Self {
        Self {
            page_token,
            sync_token,
            params: self.params.clone(),
        }
    }

    /// The full query string pairs, cursors included.
    #[must_use]
    pub fn query(&self) -> Vec<(&str, &str)> {
        let mut query: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Some(token) = &self.page_token {
            query.push(("pageToken", token));
        }
        if let Some(token) = &self.sync_token {
            query.push(("syncToken", token));
        }
        query
    }
}

/// One page returned by a list call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Records of this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Present when more pages follow in this pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    /// Present on the last page of a pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_sync_token: Option<String>,
    /// Collection entity tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Entry of the user's calendar list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    /// Calendar identifier.
    pub id: String,
    /// Title of the calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Title set by the user for their own view of the calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_override: Option<String>,
    /// IANA time zone of the calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// Whether this is the user's primary calendar.
    #[serde(default)]
    pub primary: bool,
    /// Effective access role of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
    /// Display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Whether the calendar is shown in the user's UI.
    #[serde(default)]
    pub selected: bool,
    /// Whether the entry was removed from the list (incremental listing only).
    #[serde(default)]
    pub deleted: bool,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Start or end of an event.
///
/// All-day events carry `date`, timed events carry `date_time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// Date in `yyyy-mm-dd` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// IANA time zone the time is expressed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// An all-day value.
    #[must_use]
    pub fn date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// A timed value.
    #[must_use]
    pub fn date_time(date_time: impl Into<String>, time_zone: Option<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            time_zone,
            ..Default::default()
        }
    }
}

/// Extended properties of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    /// Properties shared between attendee copies of the event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shared: BTreeMap<String, String>,
    /// Properties private to this copy of the event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub private: BTreeMap<String, String>,
}

/// File attachment of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// URL of the attachment.
    pub file_url: String,
    /// Attachment title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Calendar event.
///
/// Cancelled events in an incremental listing may carry nothing but `id` and `status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier, unique within its calendar.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// `confirmed`, `tentative` or `cancelled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Inclusive start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    /// Exclusive end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    /// Last modification time, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// Link to the event in the provider's UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    /// Parent of an expanded recurring instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    /// Extended properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
    /// File attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_request_appends_cursors_after_params() {
        let req = ListRequest::new()
            .param("showDeleted", "true")
            .with_cursors(Some("page-2".into()), None);

        assert_eq!(
            req.query(),
            vec![("showDeleted", "true"), ("pageToken", "page-2")]
        );
    }

    #[test]
    fn list_response_decodes_missing_items_as_empty() {
        let page: ListResponse<Event> =
            serde_json::from_str(r#"{"nextSyncToken":"sync-1","etag":"\"e1\""}"#).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next_page_token, None);
        assert_eq!(page.next_sync_token.as_deref(), Some("sync-1"));
        assert_eq!(page.etag.as_deref(), Some("\"e1\""));
    }

    #[test]
    fn event_keeps_unknown_fields() {
        let json = r#"{
            "id": "ev1",
            "status": "confirmed",
            "start": {"date": "2024-06-01"},
            "end": {"date": "2024-06-02"},
            "colorId": "5",
            "extendedProperties": {"shared": {"31cal/Soccer": "Soccer"}}
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event.start, Some(EventDateTime::date("2024-06-01")));
        assert_eq!(event.extra.get("colorId"), Some(&Value::from("5")));
        let shared = &event.extended_properties.as_ref().unwrap().shared;
        assert_eq!(shared.get("31cal/Soccer").map(String::as_str), Some("Soccer"));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["colorId"], "5");
        assert_eq!(back["start"]["date"], "2024-06-01");
    }

    #[test]
    fn cancelled_event_decodes_without_times() {
        let event: Event = serde_json::from_str(r#"{"id":"gone","status":"cancelled"}"#).unwrap();
        assert_eq!(event.status.as_deref(), Some("cancelled"));
        assert!(event.start.is_none());
        assert!(event.end.is_none());
    }
}
