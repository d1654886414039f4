// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use mirrorcal_gcal::GcalError;

/// Errors raised while mirroring or querying the local store.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The remote API call failed.
    #[error(transparent)]
    Remote(#[from] GcalError),

    /// A local store read or write failed.
    #[error("local store error: {0}")]
    Store(#[from] sqlx::Error),

    /// The local store schema could not be migrated.
    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A remote record could not be mapped to its local shape.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The resource key is not one of the known namespaces.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Events were requested for a calendar that is not in the local calendar list.
    #[error("cannot find calendar {0}")]
    CalendarNotFound(String),

    /// Event was not found in the local store.
    #[error("cannot find event {event_id} in calendar {calendar_id}")]
    EventNotFound {
        /// Calendar of the event.
        calendar_id: String,
        /// Event identifier.
        event_id: String,
    },

    /// A search pattern is not a valid regular expression.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Filesystem error while preparing the state directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised when mapping a remote record to its local shape.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A date or date-time value could not be parsed.
    #[error("invalid {field} value {value:?} on record {id}: {source}")]
    InvalidTime {
        /// Record identifier.
        id: String,
        /// `start` or `end`.
        field: &'static str,
        /// The offending value.
        value: String,
        /// Parser error.
        source: jiff::Error,
    },

    /// A start or end carries neither `date` nor `dateTime`.
    #[error("{field} of record {id} has neither date nor dateTime")]
    MissingTime {
        /// Record identifier.
        id: String,
        /// `start` or `end`.
        field: &'static str,
    },

    /// A time zone name is not in the time zone database.
    #[error("unknown time zone {name:?}: {source}")]
    UnknownTimeZone {
        /// The time zone name.
        name: String,
        /// Lookup error.
        source: jiff::Error,
    },

    /// The record has no identifier.
    #[error("record without id")]
    MissingId,

    /// The raw record could not be re-encoded for storage.
    #[error("failed to encode record {id}: {source}")]
    Encode {
        /// Record identifier.
        id: String,
        /// Encoder error.
        source: serde_json::Error,
    },
}
