// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use sqlx::{SqliteConnection, SqlitePool};

use crate::resource::SyncKey;
use crate::sync_state::SyncState;

#[derive(Debug, Clone)]
pub struct SyncStates {
    pool: SqlitePool,
}

impl SyncStates {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &SyncKey) -> Result<Option<SyncState>, sqlx::Error> {
        const SQL: &str = "\
SELECT account, resource, next_page_token, next_sync_token, etag, requesting, requested_at,
       updated_at, error, resync_required
FROM sync_states
WHERE account = ? AND resource = ?;
";

        sqlx::query_as(SQL)
            .bind(&key.account)
            .bind(key.resource.to_string())
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists the states of one account, or of every account.
    pub async fn list(&self, account: Option<&str>) -> Result<Vec<SyncState>, sqlx::Error> {
        const SQL: &str = "\
SELECT account, resource, next_page_token, next_sync_token, etag, requesting, requested_at,
       updated_at, error, resync_required
FROM sync_states
WHERE ? IS NULL OR account = ?
ORDER BY account ASC, resource ASC;
";

        sqlx::query_as(SQL)
            .bind(account)
            .bind(account)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn put(&self, state: &SyncState) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::put_in(&mut conn, state).await
    }

    /// Writes a state on the given connection, typically inside the page transaction.
    pub async fn put_in(conn: &mut SqliteConnection, state: &SyncState) -> Result<(), sqlx::Error> {
        const SQL: &str = "\
INSERT INTO sync_states (account, resource, next_page_token, next_sync_token, etag, requesting,
                         requested_at, updated_at, error, resync_required)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(account, resource) DO UPDATE SET
    next_page_token = excluded.next_page_token,
    next_sync_token = excluded.next_sync_token,
    etag            = excluded.etag,
    requesting      = excluded.requesting,
    requested_at    = excluded.requested_at,
    updated_at      = excluded.updated_at,
    error           = excluded.error,
    resync_required = excluded.resync_required;
";

        sqlx::query(SQL)
            .bind(&state.account)
            .bind(&state.resource)
            .bind(&state.next_page_token)
            .bind(&state.next_sync_token)
            .bind(&state.etag)
            .bind(state.requesting)
            .bind(state.requested_at)
            .bind(state.updated_at)
            .bind(&state.error)
            .bind(state.resync_required)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Clears `requesting` flags left behind by an interrupted process.
    pub async fn reset_requesting(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE sync_states SET requesting = 0 WHERE requesting = 1;")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
