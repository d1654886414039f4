// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::MirrorError;
use crate::resource::{Resource, SyncKey};

/// Progress of mirroring one resource for one account.
///
/// `next_page_token` drives the pages of one pass, `next_sync_token` resumes incremental
/// listing on the next pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct SyncState {
    /// Authenticated principal.
    pub account: String,
    /// Namespaced resource key, see [`Resource`].
    pub resource: String,
    /// Cursor for the next page of the current pass.
    pub next_page_token: Option<String>,
    /// Cursor for the next incremental pass.
    pub next_sync_token: Option<String>,
    /// Collection entity tag, stored only.
    pub etag: Option<String>,
    /// A pass is in flight.
    pub requesting: bool,
    /// Start of the last request, ms since epoch.
    pub requested_at: Option<i64>,
    /// End of the last page or pass, ms since epoch.
    pub updated_at: Option<i64>,
    /// Message of the last failure.
    pub error: Option<String>,
    /// The remote rejected the sync token; the next request lists everything.
    pub resync_required: bool,
}

impl SyncState {
    /// A fresh state for a resource that was never fetched.
    pub fn new(key: &SyncKey) -> Self {
        Self {
            account: key.account.clone(),
            resource: key.resource.to_string(),
            ..Default::default()
        }
    }

    /// Parses the resource key.
    pub fn resource(&self) -> Result<Resource, MirrorError> {
        self.resource.parse()
    }

    /// Coarse status for display.
    pub fn status(&self) -> SyncStatus {
        if self.requesting || self.next_page_token.is_some() {
            SyncStatus::Requesting
        } else if self.error.is_some() {
            SyncStatus::Failed
        } else if self.updated_at.is_some() {
            SyncStatus::UpToDate
        } else {
            SyncStatus::Never
        }
    }
}

/// Display status derived from a [`SyncState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Never fetched.
    Never,
    /// A pass is running or was interrupted between pages.
    Requesting,
    /// The last pass failed.
    Failed,
    /// The last pass completed.
    UpToDate,
}
