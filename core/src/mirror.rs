// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use futures::future::join_all;
use mirrorcal_gcal::{Event, ListRequest};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::bulk::{BulkOutcome, EventKey, EventPatch, plan_replacements, prepare_draft};
use crate::bus::{EventBus, SYNC_STATE_TOPIC, Subscription};
use crate::engine::ListSync;
use crate::filter::EventFilter;
use crate::localdb::{
    CALENDAR_DEFAULT, CalendarRecord, EventRecord, LocalDb, SELECTED_CALENDAR_IDS,
};
use crate::remote::{CalendarListEndpoint, CalendarRemote, EventsEndpoint};
use crate::resource::{Resource, SyncKey};
use crate::sync_state::SyncState;
use crate::transform::{calendar_zone, transform_calendar, transform_event};
use crate::{Config, MirrorError, Pager};

/// Mirrors remote calendars of one or more accounts into a local database.
///
/// Passes for the same account and resource are serialized; different resources are fetched
/// independently.
#[derive(Clone)]
pub struct Mirror {
    db: LocalDb,
    remote: Arc<dyn CalendarRemote>,
    bus: EventBus,
    locks: KeyLocks,
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("db", &self.db)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

/// Result of [`Mirror::sync_all`].
#[derive(Debug)]
pub struct SyncReport {
    pub calendar_list: SyncState,
    pub calendars: Vec<(String, Result<SyncState, MirrorError>)>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &MirrorError)> {
        self.calendars
            .iter()
            .filter_map(|(id, result)| result.as_ref().err().map(|e| (id.as_str(), e)))
    }
}

type KeyLocks = Arc<SyncMutex<HashMap<SyncKey, Arc<Mutex<()>>>>>;

/// Holds the pass lock of one key; the key's entry is dropped once nobody holds or awaits it.
struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: SyncKey,
    locks: KeyLocks,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

impl Mirror {
    /// Opens the local store described by `config`.
    ///
    /// Passes left marked as requesting by a previous process are reset.
    pub async fn open(
        mut config: Config,
        remote: Arc<dyn CalendarRemote>,
    ) -> Result<Self, MirrorError> {
        config.normalize()?;
        if let Some(dir) = &config.state_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let db = LocalDb::open(config.db_path().as_deref()).await?;
        let mirror = Self::new(db, remote, EventBus::new(config.bus_capacity));

        let reset = mirror.db.sync_states.reset_requesting().await?;
        if reset > 0 {
            tracing::warn!(count = reset, "reset passes interrupted by a previous run");
        }
        Ok(mirror)
    }

    pub fn new(db: LocalDb, remote: Arc<dyn CalendarRemote>, bus: EventBus) -> Self {
        Self {
            db,
            remote,
            bus,
            locks: Arc::default(),
        }
    }

    /// Closes the local store.
    pub async fn close(self) -> Result<(), MirrorError> {
        self.db.close().await
    }

    pub fn db(&self) -> &LocalDb {
        &self.db
    }

    /// Subscribes to sync-state notices.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe(SYNC_STATE_TOPIC)
    }

    async fn lock(&self, key: &SyncKey) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key.clone()).or_default().clone()
        };
        KeyGuard {
            guard: Some(lock.lock_owned().await),
            key: key.clone(),
            locks: self.locks.clone(),
        }
    }

    /// Number of keys with a pass running or waiting.
    pub fn active_keys(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs one pass for a resource.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_resource(
        &self,
        account: &str,
        resource: &Resource,
    ) -> Result<SyncState, MirrorError> {
        let key = SyncKey::new(account, resource.clone());
        let _guard = self.lock(&key).await;
        let sync = ListSync::new(&self.db, &self.bus);

        match resource {
            Resource::CalendarList => {
                let endpoint = CalendarListEndpoint::new(self.remote.as_ref());
                sync.run(
                    &key,
                    &ListRequest::new(),
                    &endpoint,
                    &self.db.calendars,
                    transform_calendar,
                )
                .await
            }
            Resource::Calendar(calendar_id) => {
                let calendar = self
                    .db
                    .calendars
                    .get(calendar_id)
                    .await?
                    .ok_or_else(|| MirrorError::CalendarNotFound(calendar_id.clone()))?;
                let tz = calendar_zone(calendar.time_zone.as_deref())?;

                let endpoint = EventsEndpoint::new(self.remote.as_ref(), calendar_id);
                sync.run(
                    &key,
                    &EventsEndpoint::base_request(),
                    &endpoint,
                    &self.db.events,
                    |event| transform_event(event, calendar_id, &tz),
                )
                .await
            }
        }
    }

    pub async fn fetch_calendar_list(&self, account: &str) -> Result<SyncState, MirrorError> {
        self.fetch_resource(account, &Resource::CalendarList).await
    }

    /// Fetches the events of several calendars concurrently.
    pub async fn fetch_events(
        &self,
        account: &str,
        calendar_ids: &[String],
    ) -> Vec<(String, Result<SyncState, MirrorError>)> {
        let passes = calendar_ids.iter().map(|id| async move {
            let resource = Resource::Calendar(id.clone());
            (id.clone(), self.fetch_resource(account, &resource).await)
        });
        join_all(passes).await
    }

    /// Fetches the calendar list, then the events of every calendar to sync.
    #[tracing::instrument(skip(self))]
    pub async fn sync_all(&self, account: &str) -> Result<SyncReport, MirrorError> {
        let calendar_list = self.fetch_calendar_list(account).await?;
        let ids = self.calendars_to_sync().await?;
        tracing::debug!(calendars = ids.len(), "fetching events");
        let calendars = self.fetch_events(account, &ids).await;
        Ok(SyncReport {
            calendar_list,
            calendars,
        })
    }

    /// Drops the stored cursors of a resource and lists it from scratch.
    pub async fn force_resync(
        &self,
        account: &str,
        resource: &Resource,
    ) -> Result<SyncState, MirrorError> {
        let key = SyncKey::new(account, resource.clone());
        {
            let _guard = self.lock(&key).await;
            if let Some(mut state) = self.db.sync_states.get(&key).await? {
                state.next_page_token = None;
                state.next_sync_token = None;
                self.db.sync_states.put(&state).await?;
            }
        }
        self.fetch_resource(account, resource).await
    }

    /// Stored sync states, the last known state of every resource.
    pub async fn status(&self, account: Option<&str>) -> Result<Vec<SyncState>, MirrorError> {
        Ok(self.db.sync_states.list(account).await?)
    }

    pub async fn calendars(&self) -> Result<Vec<CalendarRecord>, MirrorError> {
        Ok(self.db.calendars.list().await?)
    }

    pub async fn events(
        &self,
        filter: &EventFilter,
        pager: &Pager,
    ) -> Result<Vec<EventRecord>, MirrorError> {
        Ok(self.db.events.list(filter, pager).await?)
    }

    pub async fn count_events(&self, filter: &EventFilter) -> Result<i64, MirrorError> {
        Ok(self.db.events.count(filter).await?)
    }

    /// Number of live mirrored events per calendar.
    pub async fn event_counts(&self) -> Result<HashMap<String, i64>, MirrorError> {
        Ok(self.db.events.counts_by_calendar().await?.into_iter().collect())
    }

    /// Latest remote modification of the mirrored events per calendar, ms since epoch.
    pub async fn latest_updates(&self) -> Result<HashMap<String, i64>, MirrorError> {
        Ok(self
            .db
            .events
            .latest_updated_by_calendar()
            .await?
            .into_iter()
            .filter_map(|(id, ms)| ms.map(|ms| (id, ms)))
            .collect())
    }

    /// Distinct schedule tags over the mirrored events.
    pub async fn schedules(&self) -> Result<Vec<String>, MirrorError> {
        Ok(self.db.events.schedules().await?)
    }

    /// Calendar ids chosen by the user, `None` when never chosen.
    pub async fn selected_calendar_ids(&self) -> Result<Option<Vec<String>>, MirrorError> {
        let Some(value) = self.db.settings.get(SELECTED_CALENDAR_IDS).await? else {
            return Ok(None);
        };
        serde_json::from_str(&value)
            .map(Some)
            .map_err(|e| MirrorError::Config(format!("invalid {SELECTED_CALENDAR_IDS}: {e}")))
    }

    pub async fn set_selected_calendar_ids(&self, ids: &[String]) -> Result<(), MirrorError> {
        let value = serde_json::Value::from(ids.to_vec()).to_string();
        Ok(self.db.settings.put(SELECTED_CALENDAR_IDS, &value).await?)
    }

    pub async fn default_calendar(&self) -> Result<Option<String>, MirrorError> {
        Ok(self.db.settings.get(CALENDAR_DEFAULT).await?)
    }

    pub async fn set_default_calendar(&self, calendar_id: &str) -> Result<(), MirrorError> {
        self.require_calendar(calendar_id).await?;
        Ok(self.db.settings.put(CALENDAR_DEFAULT, calendar_id).await?)
    }

    /// The user's selection, or the calendars the remote marks as selected.
    pub async fn calendars_to_sync(&self) -> Result<Vec<String>, MirrorError> {
        if let Some(ids) = self.selected_calendar_ids().await? {
            return Ok(ids);
        }
        Ok(self
            .calendars()
            .await?
            .into_iter()
            .filter(|c| c.selected && !c.deleted)
            .map(|c| c.id)
            .collect())
    }

    /// Inserts drafts into a calendar, then fetches it.
    #[tracing::instrument(skip(self, drafts, description), fields(drafts = drafts.len()))]
    pub async fn save_events(
        &self,
        account: &str,
        calendar_id: &str,
        drafts: Vec<Event>,
        description: Option<&str>,
    ) -> Result<BulkOutcome<Event>, MirrorError> {
        let calendar = self.require_calendar(calendar_id).await?;
        let tz = calendar_zone(calendar.time_zone.as_deref())?;

        let mut outcome = BulkOutcome::default();
        for draft in drafts {
            let event = match prepare_draft(draft.clone(), description, &tz) {
                Ok(event) => event,
                Err(err) => {
                    outcome.failed.push((draft, err.into()));
                    continue;
                }
            };
            match self.remote.insert_event(calendar_id, &event).await {
                Ok(saved) => outcome.succeeded.push(saved),
                Err(err) => {
                    tracing::warn!(%err, summary = ?event.summary, "failed to save event");
                    outcome.failed.push((event, err.into()));
                }
            }
        }

        self.refresh_calendars(account, [calendar_id.to_string()]).await;
        Ok(outcome)
    }

    /// Sends partial updates, then fetches the affected calendars.
    #[tracing::instrument(skip_all, fields(patches = patches.len()))]
    pub async fn patch_events(&self, account: &str, patches: &[EventPatch]) -> BulkOutcome<EventKey> {
        let mut outcome = BulkOutcome::default();
        for patch in patches {
            let key = patch.key.clone();
            match self
                .remote
                .patch_event(&key.calendar_id, &key.event_id, &patch.body())
                .await
            {
                Ok(_) => outcome.succeeded.push(key),
                Err(err) => {
                    tracing::warn!(%err, event = %key.event_id, "failed to patch event");
                    outcome.failed.push((key, err.into()));
                }
            }
        }

        let calendars = patches.iter().map(|p| p.key.calendar_id.clone());
        self.refresh_calendars(account, calendars).await;
        outcome
    }

    /// Deletes events remotely, marks them cancelled locally, then fetches the calendars.
    #[tracing::instrument(skip_all, fields(events = keys.len()))]
    pub async fn delete_events(&self, account: &str, keys: &[EventKey]) -> BulkOutcome<EventKey> {
        let mut outcome = BulkOutcome::default();
        for key in keys {
            let result = match self
                .remote
                .delete_event(&key.calendar_id, &key.event_id)
                .await
            {
                Ok(()) => self.mark_deleted(key).await,
                Err(err) => Err(err.into()),
            };
            match result {
                Ok(()) => outcome.succeeded.push(key.clone()),
                Err(err) => {
                    tracing::warn!(%err, event = %key.event_id, "failed to delete event");
                    outcome.failed.push((key.clone(), err));
                }
            }
        }

        let calendars = keys.iter().map(|k| k.calendar_id.clone());
        self.refresh_calendars(account, calendars).await;
        outcome
    }

    async fn mark_deleted(&self, key: &EventKey) -> Result<(), MirrorError> {
        self.db
            .events
            .mark_cancelled(&key.calendar_id, &key.event_id)
            .await?;
        self.db.calendars.mark_dirty(&key.calendar_id).await?;
        Ok(())
    }

    /// Search and replace over the summaries of the events matching `filter`.
    pub async fn replace_in_summaries(
        &self,
        account: &str,
        filter: &EventFilter,
        pattern: &str,
        replacement: Option<&str>,
        attachment_url: Option<&str>,
    ) -> Result<BulkOutcome<EventKey>, MirrorError> {
        let events = self.events(filter, &Pager::ALL).await?;
        let patches = plan_replacements(&events, pattern, replacement, attachment_url)?;
        tracing::info!(matched = patches.len(), "replacing in summaries");
        Ok(self.patch_events(account, &patches).await)
    }

    /// Tags an event with a schedule.
    pub async fn tag_schedule(
        &self,
        account: &str,
        key: &EventKey,
        schedule: &str,
    ) -> Result<(), MirrorError> {
        self.patch_one(account, EventPatch::tag(key.clone(), schedule))
            .await
    }

    /// Removes a schedule tag from an event.
    pub async fn untag_schedule(
        &self,
        account: &str,
        key: &EventKey,
        schedule: &str,
    ) -> Result<(), MirrorError> {
        self.patch_one(account, EventPatch::untag(key.clone(), schedule))
            .await
    }

    async fn patch_one(&self, account: &str, patch: EventPatch) -> Result<(), MirrorError> {
        let mut outcome = self.patch_events(account, &[patch]).await;
        match outcome.failed.pop() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    async fn require_calendar(&self, calendar_id: &str) -> Result<CalendarRecord, MirrorError> {
        self.db
            .calendars
            .get(calendar_id)
            .await?
            .ok_or_else(|| MirrorError::CalendarNotFound(calendar_id.to_string()))
    }

    /// Targeted fetch after a local change; failures are only logged.
    async fn refresh_calendars(&self, account: &str, ids: impl IntoIterator<Item = String>) {
        let ids: Vec<String> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        for (id, result) in self.fetch_events(account, &ids).await {
            if let Err(err) = result {
                tracing::warn!(calendar = %id, %err, "failed to refresh calendar");
            }
        }
    }
}
