// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use crate::bus::PageRecords;
use crate::engine::Table;

#[derive(Debug, Clone)]
pub struct Calendars {
    pool: SqlitePool,
}

impl Calendars {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, calendar: &CalendarRecord) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::put_in(&mut conn, calendar).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<CalendarRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, summary, original_summary, time_zone, is_primary, access_role, background_color,
       selected, deleted, dirty, raw
FROM calendars
WHERE id = ?;
";

        sqlx::query_as(SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists all calendars, the primary one first.
    pub async fn list(&self) -> Result<Vec<CalendarRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, summary, original_summary, time_zone, is_primary, access_role, background_color,
       selected, deleted, dirty, raw
FROM calendars
ORDER BY is_primary DESC, summary ASC, id ASC;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    /// Flags a calendar as locally modified until the next fetch overwrites it.
    pub async fn mark_dirty(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE calendars SET dirty = 1 WHERE id = ?;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn put_in(
        conn: &mut SqliteConnection,
        calendar: &CalendarRecord,
    ) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO calendars (id, summary, original_summary, time_zone, is_primary, access_role,
                       background_color, selected, deleted, dirty, raw)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
ON CONFLICT(id) DO UPDATE SET
    summary          = excluded.summary,
    original_summary = excluded.original_summary,
    time_zone        = excluded.time_zone,
    is_primary       = excluded.is_primary,
    access_role      = excluded.access_role,
    background_color = excluded.background_color,
    selected         = excluded.selected,
    deleted          = excluded.deleted,
    dirty            = 0,
    raw              = excluded.raw;
";

        sqlx::query(SQL)
            .bind(&calendar.id)
            .bind(&calendar.summary)
            .bind(&calendar.original_summary)
            .bind(&calendar.time_zone)
            .bind(calendar.primary)
            .bind(&calendar.access_role)
            .bind(&calendar.background_color)
            .bind(calendar.selected)
            .bind(calendar.deleted)
            .bind(&calendar.raw)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Table for Calendars {
    type Record = CalendarRecord;

    async fn bulk_put(
        &self,
        conn: &mut SqliteConnection,
        records: &[CalendarRecord],
    ) -> Result<(), sqlx::Error> {
        for record in records {
            Self::put_in(conn, record).await?;
        }
        Ok(())
    }

    fn page(records: Vec<CalendarRecord>) -> PageRecords {
        PageRecords::Calendars(records)
    }
}

/// A calendar as mirrored from the remote calendar list.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct CalendarRecord {
    pub id: String,
    /// Display name, the user's override when one is set.
    pub summary: String,
    /// The calendar's own name when it was overridden.
    pub original_summary: Option<String>,
    pub time_zone: Option<String>,
    #[sqlx(rename = "is_primary")]
    pub primary: bool,
    pub access_role: Option<String>,
    pub background_color: Option<String>,
    pub selected: bool,
    pub deleted: bool,
    /// Modified locally since the last fetch.
    pub dirty: bool,
    /// The remote record as JSON.
    pub raw: String,
}

impl CalendarRecord {
    /// Writable calendars accept new events.
    pub fn is_writable(&self) -> bool {
        matches!(self.access_role.as_deref(), Some("owner" | "writer"))
    }
}
