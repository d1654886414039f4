// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Building blocks of the bulk edit tools: drafts to insert, partial updates and their outcome.

use jiff::tz::TimeZone;
use jiff::{ToSpan, Zoned};
use mirrorcal_gcal::{Attachment, Event, EventDateTime};
use regex::RegexBuilder;
use serde_json::{Map, Value, json};

use crate::MirrorError;
use crate::error::TransformError;
use crate::localdb::EventRecord;
use crate::schedule::schedule_key;
use crate::transform::resolve;

/// Identifies an event within its calendar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub calendar_id: String,
    pub event_id: String,
}

impl EventKey {
    pub fn new(calendar_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
        }
    }
}

impl From<&EventRecord> for EventKey {
    fn from(event: &EventRecord) -> Self {
        Self::new(&event.calendar_id, &event.id)
    }
}

/// A partial update of one event. Fields set to `null` are cleared by the remote.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPatch {
    pub key: EventKey,
    pub fields: Map<String, Value>,
}

impl EventPatch {
    pub fn new(key: EventKey) -> Self {
        Self {
            key,
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Adds a schedule tag.
    pub fn tag(key: EventKey, schedule: &str) -> Self {
        Self::shared_property(key, schedule_key(schedule), Value::String(schedule.to_string()))
    }

    /// Removes a schedule tag.
    pub fn untag(key: EventKey, schedule: &str) -> Self {
        Self::shared_property(key, schedule_key(schedule), Value::Null)
    }

    fn shared_property(key: EventKey, name: String, value: Value) -> Self {
        let mut shared = Map::new();
        shared.insert(name, value);
        Self::new(key).set("extendedProperties", json!({ "shared": shared }))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Request body of the patch call.
    pub fn body(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Per-item results of a bulk operation; one failing item does not stop the others.
#[derive(Debug)]
pub struct BulkOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<(T, MirrorError)>,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BulkOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Completes a draft for insertion.
///
/// A draft without end lasts one hour when timed and ends on its start date when all-day. The
/// shared `description` only fills drafts that have none of their own.
pub fn prepare_draft(
    mut draft: Event,
    description: Option<&str>,
    calendar_tz: &TimeZone,
) -> Result<Event, TransformError> {
    if draft.end.is_none() {
        let Some(start) = &draft.start else {
            return Err(TransformError::MissingTime {
                id: draft.id.clone(),
                field: "start",
            });
        };
        draft.end = Some(if start.date.is_some() {
            start.clone()
        } else {
            let start = resolve(&draft.id, "start", start, calendar_tz)?;
            let end = start
                .checked_add(1.hour())
                .map_err(|source| TransformError::InvalidTime {
                    id: draft.id.clone(),
                    field: "end",
                    value: start.to_string(),
                    source,
                })?;
            EventDateTime::date_time(format_rfc3339(&end), None)
        });
    }

    if draft.description.is_none() {
        draft.description = description.map(ToString::to_string);
    }
    Ok(draft)
}

fn format_rfc3339(zoned: &Zoned) -> String {
    zoned.strftime("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Plans the patches of a search and replace over event summaries.
///
/// `pattern` is a case-insensitive regular expression; its first match in each summary is
/// replaced, `$1`-style group references are expanded. With `attachment_url`, a link is also
/// appended to the attachments of every matching event.
pub fn plan_replacements(
    events: &[EventRecord],
    pattern: &str,
    replacement: Option<&str>,
    attachment_url: Option<&str>,
) -> Result<Vec<EventPatch>, MirrorError> {
    let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;

    let mut patches = Vec::new();
    for event in events {
        let Some(summary) = event.summary.as_deref().filter(|s| regex.is_match(s)) else {
            continue;
        };

        let mut patch = EventPatch::new(event.into());
        if let Some(replacement) = replacement {
            let replaced = regex.replace(summary, replacement);
            patch = patch.set("summary", Value::String(replaced.into_owned()));
        }
        if let Some(url) = attachment_url {
            let mut attachments = stored_attachments(event);
            attachments.push(Attachment {
                file_url: url.to_string(),
                ..Default::default()
            });
            let attachments = serde_json::to_value(attachments).map_err(|source| {
                TransformError::Encode {
                    id: event.id.clone(),
                    source,
                }
            })?;
            patch = patch.set("attachments", attachments);
        }

        if !patch.is_empty() {
            patches.push(patch);
        }
    }
    Ok(patches)
}

fn stored_attachments(event: &EventRecord) -> Vec<Attachment> {
    match serde_json::from_str::<Event>(&event.raw) {
        Ok(raw) => raw.attachments,
        Err(err) => {
            tracing::warn!(id = %event.id, %err, "stored event is not valid JSON");
            Vec::new()
        }
    }
}
