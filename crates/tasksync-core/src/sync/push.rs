//! Local into remote.

use super::{SyncDirection, SyncRequest, SyncResult, SyncService};

/// Pushes a source (usually local) into a target (usually the hosted store).
///
/// Defaults to `local_wins`. A target task strictly newer than the source is
/// left alone and reported as a `skipped_remote_newer` conflict.
pub struct SyncPushService {
    service: SyncService,
}

impl SyncPushService {
    pub const fn new(service: SyncService) -> Self {
        Self { service }
    }

    pub async fn push(&mut self, request: &SyncRequest) -> SyncResult {
        self.service.run(SyncDirection::Push, request).await
    }

    pub const fn service(&self) -> &SyncService {
        &self.service
    }

    pub fn into_inner(self) -> SyncService {
        self.service
    }
}
