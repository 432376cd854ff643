use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::types::ErrorRecord;

/// Origin tag attached to outcomes forwarded by the orchestrator.
pub const AUTO_RECOVERY_ORIGIN: &str = "auto_recovery";

/// External audit/metrics sink that receives every completed recovery.
#[async_trait]
pub trait RecoveryTracker: Send + Sync {
    async fn record_attempt(
        &self,
        error: &ErrorRecord,
        origin: &str,
        success: bool,
        escalate: bool,
        duration: Duration,
    );
}

/// Emits each outcome as a structured event on the `recovery_pilot::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

#[async_trait]
impl RecoveryTracker for LogTracker {
    async fn record_attempt(
        &self,
        error: &ErrorRecord,
        origin: &str,
        success: bool,
        escalate: bool,
        duration: Duration,
    ) {
        let duration_ms = duration.as_millis() as u64;
        if escalate {
            warn!(
                target: "recovery_pilot::audit",
                error_id = %error.id,
                category = %error.category,
                origin,
                success,
                escalate,
                duration_ms,
                "Recovery escalated"
            );
        } else {
            info!(
                target: "recovery_pilot::audit",
                error_id = %error.id,
                category = %error.category,
                origin,
                success,
                escalate,
                duration_ms,
                "Recovery attempt recorded"
            );
        }
    }
}
