// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

mod calendars;
mod events;
mod settings;
mod sync_states;

#[cfg(test)]
pub(crate) mod tests_utils;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};

use crate::MirrorError;

pub use crate::localdb::calendars::{CalendarRecord, Calendars};
pub use crate::localdb::events::{EventRecord, Events};
pub use crate::localdb::settings::{CALENDAR_DEFAULT, GOOGLE_TOKEN, SELECTED_CALENDAR_IDS, Settings};
pub use crate::localdb::sync_states::SyncStates;

/// Local mirror of remote calendars, events and their sync state.
#[derive(Debug, Clone)]
pub struct LocalDb {
    pool: SqlitePool,

    pub calendars: Calendars,
    pub events: Events,
    pub sync_states: SyncStates,
    pub settings: Settings,
}

impl LocalDb {
    /// Opens a sqlite database connection.
    /// If `filename` is `None`, it opens an in-memory database.
    pub async fn open(filename: Option<&Path>) -> Result<Self, MirrorError> {
        let pool = if let Some(filename) = filename {
            tracing::info!(path = %filename.display(), "connecting to SQLite database");
            let options = SqliteConnectOptions::new()
                .filename(filename)
                .create_if_missing(true);
            SqlitePoolOptions::new().connect_with(options).await?
        } else {
            tracing::info!("connecting to in-memory SQLite database");
            // every connection to :memory: is a separate database, keep exactly one alive
            let options = SqliteConnectOptions::new().in_memory(true);
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("src/localdb/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        tracing::debug!("database ready");
        Ok(LocalDb {
            calendars: Calendars::new(pool.clone()),
            events: Events::new(pool.clone()),
            sync_states: SyncStates::new(pool.clone()),
            settings: Settings::new(pool.clone()),
            pool,
        })
    }

    /// Starts a transaction spanning any of the tables.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn close(self) -> Result<(), MirrorError> {
        tracing::debug!("closing database connection");
        self.pool.close().await;
        Ok(())
    }
}
