//! Per-source synchronization status tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a synchronization run for one named source.
///
/// Transitions are strictly `running -> {success, error}` within a run.
/// A fresh run simply reasserts `running`, so a row stuck in `running`
/// after a crash needs no special handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Running,
    Success,
    Error,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Sync status record, one row per named source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceStatus {
    /// Source name, e.g. "full_sync".
    pub source_name: String,
    pub status: SyncState,
    pub last_sync: DateTime<Utc>,
    /// Set iff status is `Error`.
    pub error_message: Option<String>,
}

impl DataSourceStatus {
    /// Create a status entering the `running` state.
    pub fn running(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            status: SyncState::Running,
            last_sync: Utc::now(),
            error_message: None,
        }
    }

    /// Mark the run as completed successfully.
    pub fn complete(&mut self) {
        self.status = SyncState::Success;
        self.last_sync = Utc::now();
        self.error_message = None;
    }

    /// Mark the run as failed, recording the message.
    pub fn fail(&mut self, message: &str) {
        self.status = SyncState::Error;
        self.error_message = Some(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_state_roundtrip() {
        for state in [
            SyncState::Pending,
            SyncState::Running,
            SyncState::Success,
            SyncState::Error,
        ] {
            assert_eq!(SyncState::from_str(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_sync_state_from_invalid() {
        assert_eq!(SyncState::from_str("unknown"), None);
        assert_eq!(SyncState::from_str(""), None);
    }

    #[test]
    fn test_running_to_success() {
        let mut status = DataSourceStatus::running("full_sync");
        assert_eq!(status.status, SyncState::Running);
        assert_eq!(status.error_message, None);

        status.complete();
        assert_eq!(status.status, SyncState::Success);
        assert_eq!(status.error_message, None);
    }

    #[test]
    fn test_running_to_error() {
        let mut status = DataSourceStatus::running("full_sync");
        status.fail("API Error");
        assert_eq!(status.status, SyncState::Error);
        assert_eq!(status.error_message, Some("API Error".to_string()));
    }
}
