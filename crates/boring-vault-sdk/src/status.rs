use crate::VaultError;
use alloy_primitives::B256;
use log::{debug, info, warn};
use std::sync::{Mutex, PoisonError};

/// Progress of a single orchestrated action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Initiated,
    Approving,
    Signing,
    Submitted,
    Succeeded,
    Failed,
}

/// Status record returned by every write operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub initiated: bool,
    pub loading: bool,
    pub success: Option<bool>,
    pub error: Option<String>,
    pub tx_hash: Option<B256>,
    pub phase: Phase,
}

impl Status {
    fn in_flight(phase: Phase) -> Self {
        Self {
            initiated: true,
            loading: true,
            phase,
            ..Self::default()
        }
    }

    pub fn succeeded(tx_hash: B256) -> Self {
        Self {
            initiated: true,
            loading: false,
            success: Some(true),
            error: None,
            tx_hash: Some(tx_hash),
            phase: Phase::Succeeded,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            initiated: true,
            loading: false,
            success: Some(false),
            error: Some(error.to_string()),
            tx_hash: None,
            phase: Phase::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

/// Last-writer-wins holder of the status of one flow (deposit, withdraw,
/// bridge, claim). Every transition overwrites the previous value.
#[derive(Debug, Default)]
pub struct StatusTracker {
    current: Mutex<Status>,
}

impl StatusTracker {
    pub fn get(&self) -> Status {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, status: Status) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = status;
    }

    pub(crate) fn transition(&self, phase: Phase) {
        debug!("status -> {phase:?}");
        self.set(Status::in_flight(phase));
    }

    /// Runs `action` from `Initiated` to a terminal state and returns the
    /// final status. Actions never resume; a failure must be re-invoked.
    pub(crate) fn run<F>(&self, label: &str, action: F) -> Status
    where
        F: FnOnce() -> Result<B256, VaultError>,
    {
        self.transition(Phase::Initiated);
        let status = match action() {
            Ok(tx_hash) => {
                info!("{label} succeeded: {tx_hash}");
                Status::succeeded(tx_hash)
            }
            Err(err) => {
                warn!("{label} failed: {err}");
                Status::failed(err)
            }
        };
        self.set(status.clone());
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_starts_idle() {
        let tracker = StatusTracker::default();
        let status = tracker.get();
        assert_eq!(status.phase, Phase::Idle);
        assert!(!status.initiated);
        assert!(status.success.is_none());
    }

    #[test]
    fn test_run_records_success() {
        let tracker = StatusTracker::default();
        let hash = B256::repeat_byte(0xab);
        let status = tracker.run("test", || Ok(hash));
        assert!(status.is_success());
        assert_eq!(status.tx_hash, Some(hash));
        assert!(!status.loading);
        assert_eq!(tracker.get(), status);
    }

    #[test]
    fn test_run_records_failure_message() {
        let tracker = StatusTracker::default();
        let status = tracker.run("test", || Err(VaultError::NotReady));
        assert_eq!(status.success, Some(false));
        assert_eq!(status.error.as_deref(), Some("Contracts or user not ready"));
        assert_eq!(status.phase, Phase::Failed);
    }

    #[test]
    fn test_transition_marks_loading() {
        let tracker = StatusTracker::default();
        tracker.transition(Phase::Approving);
        let status = tracker.get();
        assert!(status.initiated && status.loading);
        assert_eq!(status.phase, Phase::Approving);
    }
}
