// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The list-sync engine: mirrors one paginated remote collection into one local table.
//!
//! A pass walks the pages of a listing, starting from the cursors stored in the resource's
//! [`SyncState`]. Each page is written together with the advanced state in one transaction, so
//! an interrupted pass resumes at the first page that was not committed.

use async_trait::async_trait;
use jiff::Timestamp;
use mirrorcal_gcal::{GcalError, ListRequest, ListResponse};
use sqlx::SqliteConnection;

use crate::bus::{EventBus, PageRecords, SYNC_STATE_TOPIC, SyncChange, SyncNotice};
use crate::error::TransformError;
use crate::localdb::{GOOGLE_TOKEN, LocalDb, SyncStates};
use crate::resource::SyncKey;
use crate::sync_state::SyncState;
use crate::MirrorError;

/// A paginated remote list call.
#[async_trait]
pub trait ListEndpoint: Send + Sync {
    type Item: Send;

    async fn list(&self, request: &ListRequest) -> Result<ListResponse<Self::Item>, GcalError>;
}

/// A local table the engine can bulk-write a page into.
#[async_trait]
pub trait Table: Send + Sync {
    type Record: Clone + Send + Sync;

    /// Upserts the records on `conn`, clearing their `dirty` flag.
    async fn bulk_put(
        &self,
        conn: &mut SqliteConnection,
        records: &[Self::Record],
    ) -> Result<(), sqlx::Error>;

    /// Wraps a committed page for notification.
    fn page(records: Vec<Self::Record>) -> PageRecords;
}

/// Runs list-sync passes against a local database, announcing progress on a bus.
#[derive(Debug, Clone, Copy)]
pub struct ListSync<'a> {
    db: &'a LocalDb,
    bus: &'a EventBus,
}

impl<'a> ListSync<'a> {
    pub fn new(db: &'a LocalDb, bus: &'a EventBus) -> Self {
        Self { db, bus }
    }

    /// Runs one pass for `key`, returning the final state.
    ///
    /// `request` holds the first-page query parameters, cursors are taken from the stored state.
    /// Any failure ends the pass: the state records the error, pages committed before it stay,
    /// and the error is returned.
    #[tracing::instrument(skip_all, fields(key = %key))]
    pub async fn run<E, T, F>(
        &self,
        key: &SyncKey,
        request: &ListRequest,
        endpoint: &E,
        table: &T,
        transformation: F,
    ) -> Result<SyncState, MirrorError>
    where
        E: ListEndpoint,
        T: Table,
        F: Fn(E::Item) -> Result<T::Record, TransformError> + Send + Sync,
    {
        let mut state = match self.db.sync_states.get(key).await? {
            Some(state) => state,
            None => SyncState::new(key),
        };

        let result = self
            .pass(&mut state, request, endpoint, table, &transformation)
            .await;

        let previous = state.clone();
        state.requesting = false;
        state.updated_at = Some(now_ms());
        match result {
            Ok(pages) => {
                state.error = None;
                self.db.sync_states.put(&state).await?;
                tracing::debug!(pages, "pass completed");
                self.notify(previous, state.clone(), SyncChange::Completed);
                Ok(state)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, "pass failed");
                state.error = Some(message.clone());
                if let Err(e) = self.db.sync_states.put(&state).await {
                    tracing::error!(error = %e, "failed to record sync failure");
                }
                if let MirrorError::Remote(remote) = &err {
                    if remote.is_auth() {
                        self.save_auth_failure(remote).await;
                    }
                }
                self.notify(previous, state, SyncChange::Failed { error: message });
                Err(err)
            }
        }
    }

    /// Walks the pages, returning how many were committed.
    async fn pass<E, T, F>(
        &self,
        state: &mut SyncState,
        request: &ListRequest,
        endpoint: &E,
        table: &T,
        transformation: &F,
    ) -> Result<usize, MirrorError>
    where
        E: ListEndpoint,
        T: Table,
        F: Fn(E::Item) -> Result<T::Record, TransformError> + Send + Sync,
    {
        let mut pages = 0;
        loop {
            let previous = state.clone();
            state.requesting = true;
            state.requested_at = Some(now_ms());
            state.error = None;
            self.db.sync_states.put(state).await?;
            self.notify(previous, state.clone(), SyncChange::Requesting);

            let current = request.with_cursors(
                state.next_page_token.clone(),
                state.next_sync_token.clone(),
            );
            let response = match endpoint.list(&current).await {
                Ok(response) => response,
                Err(err)
                    if err.is_sync_token_expired()
                        && (current.page_token.is_some() || current.sync_token.is_some()) =>
                {
                    tracing::info!("sync token expired, listing from scratch");
                    let previous = state.clone();
                    state.next_page_token = None;
                    state.next_sync_token = None;
                    state.resync_required = true;
                    self.db.sync_states.put(state).await?;
                    self.notify(previous, state.clone(), SyncChange::ResyncRequired);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let records = response
                .items
                .into_iter()
                .map(transformation)
                .collect::<Result<Vec<_>, _>>()?;

            let mut next = state.clone();
            next.next_page_token = response.next_page_token;
            next.next_sync_token = response.next_sync_token;
            next.etag = response.etag;
            next.updated_at = Some(now_ms());
            next.resync_required = false;

            let mut tx = self.db.begin().await?;
            table.bulk_put(&mut *tx, &records).await?;
            SyncStates::put_in(&mut *tx, &next).await?;
            tx.commit().await?;

            pages += 1;
            tracing::debug!(page = pages, items = records.len(), "page committed");
            let previous = std::mem::replace(state, next);
            self.notify(previous, state.clone(), SyncChange::Page(T::page(records)));

            if state.next_page_token.is_none() {
                return Ok(pages);
            }
        }
    }

    async fn save_auth_failure(&self, err: &GcalError) {
        let Some(payload) = err.raw_payload() else {
            return;
        };
        tracing::warn!("authorization rejected, keeping the error payload");
        if let Err(e) = self
            .db
            .settings
            .put(GOOGLE_TOKEN, &payload.to_string())
            .await
        {
            tracing::error!(error = %e, "failed to persist authorization failure");
        }
    }

    fn notify(&self, previous: SyncState, current: SyncState, change: SyncChange) {
        let notice = SyncNotice {
            previous,
            current,
            change,
        };
        self.bus.publish(SYNC_STATE_TOPIC, notice);
    }
}

fn now_ms() -> i64 {
    Timestamp::now().as_millisecond()
}
