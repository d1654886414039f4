// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-process notification of sync-state changes.
//!
//! Delivery is best effort: a subscriber only sees notices published after it subscribed, and
//! a subscriber that falls more than the bus capacity behind skips the oldest notices.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::localdb::{CalendarRecord, EventRecord};
use crate::sync_state::SyncState;

/// Topic of [`SyncNotice`]s.
pub const SYNC_STATE_TOPIC: &str = "syncState";

/// Default number of notices buffered per topic.
pub const DEFAULT_CAPACITY: usize = 256;

/// Records written by one page of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRecords {
    Calendars(Vec<CalendarRecord>),
    Events(Vec<EventRecord>),
}

impl PageRecords {
    pub fn len(&self) -> usize {
        match self {
            PageRecords::Calendars(records) => records.len(),
            PageRecords::Events(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to a sync state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange {
    /// A request was issued.
    Requesting,
    /// A page was committed.
    Page(PageRecords),
    /// The sync token was rejected, the pass restarts with empty cursors.
    ResyncRequired,
    /// The pass completed.
    Completed,
    /// The pass failed.
    Failed { error: String },
}

/// A sync-state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub previous: SyncState,
    pub current: SyncState,
    pub change: SyncChange,
}

/// Publish/subscribe hub keyed by topic.
#[derive(Debug, Clone)]
pub struct EventBus {
    capacity: usize,
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<SyncNotice>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Arc::default(),
        }
    }

    /// Publishes a notice, returning how many subscribers will see it.
    pub fn publish(&self, topic: &str, notice: SyncNotice) -> usize {
        let topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        match topics.get(topic) {
            Some(sender) => sender.send(notice).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscribe(&self, topic: &str) -> Subscription {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let receiver = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        Subscription {
            topic: topic.to_string(),
            receiver,
        }
    }
}

/// Receiving end of one topic.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<SyncNotice>,
}

impl Subscription {
    /// Waits for the next notice, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SyncNotice> {
        loop {
            match self.receiver.recv().await {
                Ok(notice) => return Some(notice),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a pending notice without waiting.
    pub fn try_recv(&mut self) -> Option<SyncNotice> {
        loop {
            match self.receiver.try_recv() {
                Ok(notice) => return Some(notice),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "subscriber lagged behind");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Resource, SyncKey};

    fn notice(change: SyncChange) -> SyncNotice {
        let state = SyncState::new(&SyncKey::new("me", Resource::CalendarList));
        SyncNotice {
            previous: state.clone(),
            current: state,
            change,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_notices_published_after_subscribing() {
        let bus = EventBus::new(8);
        assert_eq!(bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::Requesting)), 0);

        let mut early = bus.subscribe(SYNC_STATE_TOPIC);
        assert_eq!(bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::Completed)), 1);
        let mut late = bus.subscribe(SYNC_STATE_TOPIC);

        assert_eq!(early.recv().await.unwrap().change, SyncChange::Completed);
        assert_eq!(late.try_recv(), None);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let bus = EventBus::default();
        let mut other = bus.subscribe("other");
        bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::Completed));

        assert_eq!(other.try_recv(), None);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_retained_notices() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe(SYNC_STATE_TOPIC);
        bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::Requesting));
        bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::ResyncRequired));
        bus.publish(SYNC_STATE_TOPIC, notice(SyncChange::Completed));

        assert_eq!(sub.recv().await.unwrap().change, SyncChange::ResyncRequired);
        assert_eq!(sub.try_recv().unwrap().change, SyncChange::Completed);
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn page_records_len() {
        assert!(PageRecords::Events(vec![]).is_empty());
        assert_eq!(
            PageRecords::Calendars(vec![CalendarRecord::default()]).len(),
            1
        );
    }
}
