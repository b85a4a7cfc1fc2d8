// ABOUTME: Queued deployment request and its status lifecycle.
// ABOUTME: Status lives in a shared cell so an external actor can cancel mid-flight.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{ApplicationId, DeploymentId};

/// Terminal and intermediate states of one deployment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Queued,
    InProgress,
    Finished,
    Failed,
    CancelledByUser,
}

impl DeploymentStatus {
    /// Whether this status is terminal and must never be overwritten.
    pub fn is_sticky(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Failed | DeploymentStatus::CancelledByUser
        )
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeploymentStatus::Queued => "queued",
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Finished => "finished",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::CancelledByUser => "cancelled_by_user",
        };
        write!(f, "{s}")
    }
}

/// Shared status store for one deployment request.
///
/// `Failed` and `CancelledByUser` are sticky: once set, a later write (in
/// particular `Finished`) is rejected. The cell is shared between the
/// supervisor and external actors (cancellation).
#[derive(Debug, Clone)]
pub struct StatusCell {
    inner: Arc<Mutex<DeploymentStatus>>,
}

impl StatusCell {
    pub fn new(status: DeploymentStatus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(status)),
        }
    }

    pub fn get(&self) -> DeploymentStatus {
        *self.inner.lock()
    }

    /// Attempt a transition. Returns `true` if the write was accepted.
    pub fn set(&self, status: DeploymentStatus) -> bool {
        let mut current = self.inner.lock();
        if current.is_sticky() {
            return false;
        }
        *current = status;
        true
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new(DeploymentStatus::Queued)
    }
}

/// One queued deployment attempt, created by the external scheduler.
///
/// The engine mutates only the status (through the shared [`StatusCell`]);
/// everything else is read-only input. Terminal states are final.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub deployment_id: DeploymentId,
    pub application_id: ApplicationId,
    pub commit: String,
    /// 0 means this is not a pull-request deployment.
    pub pull_request_id: u64,
    pub force_rebuild: bool,
    pub restart_only: bool,
    pub only_this_server: bool,
    pub is_webhook: bool,
    pub status: StatusCell,
}

impl DeploymentRequest {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request_id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_does_not_overwrite_failed() {
        let cell = StatusCell::new(DeploymentStatus::InProgress);
        assert!(cell.set(DeploymentStatus::Failed));
        assert!(!cell.set(DeploymentStatus::Finished));
        assert_eq!(cell.get(), DeploymentStatus::Failed);
    }

    #[test]
    fn finished_does_not_overwrite_cancelled() {
        let cell = StatusCell::new(DeploymentStatus::InProgress);
        assert!(cell.set(DeploymentStatus::CancelledByUser));
        assert!(!cell.set(DeploymentStatus::Finished));
        assert_eq!(cell.get(), DeploymentStatus::CancelledByUser);
    }

    #[test]
    fn normal_progression_is_accepted() {
        let cell = StatusCell::default();
        assert_eq!(cell.get(), DeploymentStatus::Queued);
        assert!(cell.set(DeploymentStatus::InProgress));
        assert!(cell.set(DeploymentStatus::Finished));
        assert_eq!(cell.get(), DeploymentStatus::Finished);
    }
}
