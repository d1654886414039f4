// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::SqlitePool;

/// Key of the JSON array of calendar ids to mirror.
pub const SELECTED_CALENDAR_IDS: &str = "selectedCalendarIds";

/// Key of the calendar new events go to.
pub const CALENDAR_DEFAULT: &str = "calendarDefault";

/// Key holding the raw payload of the last authorization failure.
pub const GOOGLE_TOKEN: &str = "googleToken";

#[derive(Debug, Clone)]
pub struct Settings {
    pool: SqlitePool,
}

impl Settings {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?;")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO settings (key, value) VALUES (?, ?)
ON CONFLICT(key) DO UPDATE SET value = excluded.value;
";

        sqlx::query(SQL)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?;")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(&self) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query_as("SELECT key, value FROM settings ORDER BY key ASC;")
            .fetch_all(&self.pool)
            .await
    }
}
