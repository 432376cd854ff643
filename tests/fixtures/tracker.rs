use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use recovery_pilot::recovery::{ErrorCategory, ErrorRecord, RecoveryTracker};

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedAttempt {
    pub category: ErrorCategory,
    pub origin: String,
    pub success: bool,
    pub escalate: bool,
}

/// Tracker that keeps every forwarded outcome in memory.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    attempts: Mutex<Vec<TrackedAttempt>>,
}

impl RecordingTracker {
    pub fn attempts(&self) -> Vec<TrackedAttempt> {
        self.attempts.lock().clone()
    }
}

#[async_trait]
impl RecoveryTracker for RecordingTracker {
    async fn record_attempt(
        &self,
        error: &ErrorRecord,
        origin: &str,
        success: bool,
        escalate: bool,
        _duration: Duration,
    ) {
        self.attempts.lock().push(TrackedAttempt {
            category: error.category,
            origin: origin.to_string(),
            success,
            escalate,
        });
    }
}
