//! Remote into local.

use super::{SyncDirection, SyncRequest, SyncResult, SyncService};

/// Pulls a source (usually the hosted store) into a target (usually local).
///
/// Defaults to `remote_wins`: the target is overwritten only by strictly
/// newer source items, and a strictly newer target task is reported as a
/// `skipped_local_newer` conflict.
pub struct SyncPullService {
    service: SyncService,
}

impl SyncPullService {
    pub const fn new(service: SyncService) -> Self {
        Self { service }
    }

    pub async fn pull(&mut self, request: &SyncRequest) -> SyncResult {
        self.service.run(SyncDirection::Pull, request).await
    }

    pub const fn service(&self) -> &SyncService {
        &self.service
    }

    pub fn into_inner(self) -> SyncService {
        self.service
    }
}
