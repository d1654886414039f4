// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, query::QueryAs, sqlite::SqliteArguments};

use crate::Pager;
use crate::bus::PageRecords;
use crate::engine::Table;
use crate::filter::EventFilter;

const STATUS_CANCELLED: &str = "cancelled";

#[derive(Debug, Clone)]
pub struct Events {
    pool: SqlitePool,
}

impl Events {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, event: &EventRecord) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        Self::put_in(&mut tx, event).await?;
        tx.commit().await
    }

    pub async fn get(
        &self,
        calendar_id: &str,
        id: &str,
    ) -> Result<Option<EventRecord>, sqlx::Error> {
        const SQL: &str = "\
SELECT id, calendar_id, status, summary, description, location, start_ms, end_ms, all_day,
       updated, updated_ms, html_link, recurring_event_id, schedules, dirty, raw
FROM events
WHERE calendar_id = ? AND id = ?;
";

        sqlx::query_as(SQL)
            .bind(calendar_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists the events visible under `filter`, ordered by start.
    pub async fn list(
        &self,
        filter: &EventFilter,
        pager: &Pager,
    ) -> Result<Vec<EventRecord>, sqlx::Error> {
        let mut sql = "\
SELECT id, calendar_id, status, summary, description, location, start_ms, end_ms, all_day,
       updated, updated_ms, html_link, recurring_event_id, schedules, dirty, raw
FROM events
"
        .to_string();
        sql += &Self::build_where(filter);
        sql += "ORDER BY start_ms ASC, calendar_id ASC, id ASC LIMIT ? OFFSET ?;";

        let mut executable = sqlx::query_as(&sql);
        executable = Self::bind_conditions(filter, executable);

        executable
            .bind(pager.limit)
            .bind(pager.offset)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count(&self, filter: &EventFilter) -> Result<i64, sqlx::Error> {
        let mut sql = "SELECT COUNT(*) FROM events".to_string();
        sql += &Self::build_where(filter);
        sql += ";";

        let mut executable = sqlx::query_as(&sql);
        executable = Self::bind_conditions(filter, executable);

        let row: (i64,) = executable.fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    /// Optimistically marks a deleted event until the next fetch confirms it.
    pub async fn mark_cancelled(&self, calendar_id: &str, id: &str) -> Result<bool, sqlx::Error> {
        const SQL: &str = "\
UPDATE events SET status = ?, dirty = 1
WHERE calendar_id = ? AND id = ?;
";

        let result = sqlx::query(SQL)
            .bind(STATUS_CANCELLED)
            .bind(calendar_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Distinct schedule tags over all live events.
    pub async fn schedules(&self) -> Result<Vec<String>, sqlx::Error> {
        const SQL: &str = "\
SELECT DISTINCT s.schedule
FROM event_schedules s
JOIN events e ON e.calendar_id = s.calendar_id AND e.id = s.event_id
WHERE e.status IS NULL OR e.status <> 'cancelled'
ORDER BY s.schedule ASC;
";

        let rows: Vec<(String,)> = sqlx::query_as(SQL).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(schedule,)| schedule).collect())
    }

    /// Number of live events per calendar.
    pub async fn counts_by_calendar(&self) -> Result<Vec<(String, i64)>, sqlx::Error> {
        const SQL: &str = "\
SELECT calendar_id, COUNT(*)
FROM events
WHERE status IS NULL OR status <> 'cancelled'
GROUP BY calendar_id
ORDER BY calendar_id ASC;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    /// Latest remote modification time per calendar, ms since epoch.
    pub async fn latest_updated_by_calendar(
        &self,
    ) -> Result<Vec<(String, Option<i64>)>, sqlx::Error> {
        const SQL: &str = "\
SELECT calendar_id, MAX(updated_ms)
FROM events
GROUP BY calendar_id
ORDER BY calendar_id ASC;
";

        sqlx::query_as(SQL).fetch_all(&self.pool).await
    }

    async fn put_in(conn: &mut SqliteConnection, event: &EventRecord) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO events (id, calendar_id, status, summary, description, location, start_ms, end_ms,
                    all_day, updated, updated_ms, html_link, recurring_event_id, schedules,
                    dirty, raw)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
ON CONFLICT(id, calendar_id) DO UPDATE SET
    status             = excluded.status,
    summary            = excluded.summary,
    description        = excluded.description,
    location           = excluded.location,
    start_ms           = excluded.start_ms,
    end_ms             = excluded.end_ms,
    all_day            = excluded.all_day,
    updated            = excluded.updated,
    updated_ms         = excluded.updated_ms,
    html_link          = excluded.html_link,
    recurring_event_id = excluded.recurring_event_id,
    schedules          = excluded.schedules,
    dirty              = 0,
    raw                = excluded.raw;
";

        sqlx::query(SQL)
            .bind(&event.id)
            .bind(&event.calendar_id)
            .bind(&event.status)
            .bind(&event.summary)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.start_ms)
            .bind(event.end_ms)
            .bind(event.all_day)
            .bind(&event.updated)
            .bind(event.updated_ms)
            .bind(&event.html_link)
            .bind(&event.recurring_event_id)
            .bind(Json(&event.schedules))
            .bind(&event.raw)
            .execute(&mut *conn)
            .await?;

        sqlx::query("DELETE FROM event_schedules WHERE calendar_id = ? AND event_id = ?;")
            .bind(&event.calendar_id)
            .bind(&event.id)
            .execute(&mut *conn)
            .await?;

        for schedule in &event.schedules {
            sqlx::query(
                "INSERT OR IGNORE INTO event_schedules (calendar_id, event_id, schedule) VALUES (?, ?, ?);",
            )
            .bind(&event.calendar_id)
            .bind(&event.id)
            .bind(schedule)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    fn build_where(filter: &EventFilter) -> String {
        let mut where_clauses: Vec<String> = Vec::new();
        if !filter.show_cancelled {
            where_clauses.push("(status IS NULL OR status <> 'cancelled')".into());
        }
        if filter.start_ms.is_some() {
            where_clauses.push("(end_ms IS NULL OR ? < end_ms)".into());
        }
        if filter.end_ms.is_some() {
            where_clauses.push("(start_ms IS NULL OR start_ms <= ?)".into());
        }
        if filter.updated_since_ms.is_some() {
            where_clauses.push("updated_ms > ?".into());
        }
        if let Some(ids) = &filter.calendar_ids {
            if ids.is_empty() {
                where_clauses.push("0".into()); // nothing selected
            } else {
                where_clauses.push(format!("calendar_id IN ({})", placeholders(ids.len())));
            }
        }
        if !filter.schedules.is_empty() {
            where_clauses.push(format!(
                "EXISTS (SELECT 1 FROM event_schedules s \
WHERE s.calendar_id = events.calendar_id AND s.event_id = events.id AND s.schedule IN ({}))",
                placeholders(filter.schedules.len())
            ));
        }
        if filter.text.as_deref().is_some_and(|t| !t.is_empty()) {
            where_clauses.push(
                "(summary LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' OR location LIKE ? ESCAPE '\\')"
                    .into(),
            );
        }

        if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {} ", where_clauses.join(" AND "))
        }
    }

    fn bind_conditions<'a, O>(
        filter: &'a EventFilter,
        mut query: QueryAs<'a, Sqlite, O, SqliteArguments<'a>>,
    ) -> QueryAs<'a, Sqlite, O, SqliteArguments<'a>> {
        if let Some(start) = filter.start_ms {
            query = query.bind(start);
        }
        if let Some(end) = filter.end_ms {
            query = query.bind(end);
        }
        if let Some(updated) = filter.updated_since_ms {
            query = query.bind(updated);
        }
        if let Some(ids) = &filter.calendar_ids {
            for id in ids {
                query = query.bind(id);
            }
        }
        for schedule in &filter.schedules {
            query = query.bind(schedule);
        }
        if let Some(text) = filter.text.as_deref().filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            query = query
                .bind(pattern.clone())
                .bind(pattern.clone())
                .bind(pattern);
        }
        query
    }
}

#[async_trait]
impl Table for Events {
    type Record = EventRecord;

    async fn bulk_put(
        &self,
        conn: &mut SqliteConnection,
        records: &[EventRecord],
    ) -> Result<(), sqlx::Error> {
        for record in records {
            Self::put_in(conn, record).await?;
        }
        Ok(())
    }

    fn page(records: Vec<EventRecord>) -> PageRecords {
        PageRecords::Events(records)
    }
}

/// An event as mirrored from one calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: String,
    pub calendar_id: String,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Start instant, ms since epoch.
    pub start_ms: Option<i64>,
    /// End instant (exclusive), ms since epoch.
    pub end_ms: Option<i64>,
    pub all_day: bool,
    /// Remote modification time as sent.
    pub updated: Option<String>,
    pub updated_ms: Option<i64>,
    pub html_link: Option<String>,
    pub recurring_event_id: Option<String>,
    /// Schedule tags from the shared extended properties.
    #[sqlx(json)]
    pub schedules: Vec<String>,
    /// Modified locally since the last fetch.
    pub dirty: bool,
    /// The remote record as JSON.
    pub raw: String,
}

impl EventRecord {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CANCELLED)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
