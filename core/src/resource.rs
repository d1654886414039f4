// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use crate::MirrorError;

const CALENDAR_LIST: &str = "calendarList";
const CALENDAR_PREFIX: &str = "calendar/";

/// A remote collection mirrored into one local table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The user's calendar list, stored as `calendarList`.
    CalendarList,

    /// The events of one calendar, stored as `calendar/<id>`.
    Calendar(String),
}

impl Resource {
    /// Calendar id of an event collection.
    pub fn calendar_id(&self) -> Option<&str> {
        match self {
            Resource::CalendarList => None,
            Resource::Calendar(id) => Some(id),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::CalendarList => f.write_str(CALENDAR_LIST),
            Resource::Calendar(id) => write!(f, "{CALENDAR_PREFIX}{id}"),
        }
    }
}

impl FromStr for Resource {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CALENDAR_LIST {
            return Ok(Resource::CalendarList);
        }
        match s.strip_prefix(CALENDAR_PREFIX) {
            Some(id) if !id.is_empty() => Ok(Resource::Calendar(id.to_string())),
            _ => Err(MirrorError::UnknownResource(s.to_string())),
        }
    }
}

/// Identifies one sync-state record: a resource as seen by one account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey {
    /// Authenticated principal.
    pub account: String,

    /// Mirrored collection.
    pub resource: Resource,
}

impl SyncKey {
    /// Creates a key.
    pub fn new(account: impl Into<String>, resource: Resource) -> Self {
        Self {
            account: account.into(),
            resource,
        }
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account, self.resource)
    }
}
