use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::{Instant, sleep, sleep_until};

use crate::recovery::{
    ConnectivityProbe, ErrorCategory, ErrorRecord, RecoveryContext, RecoveryOrchestrator,
    RecoveryResult,
};

/// Connectivity probe whose answer follows a fixed schedule instead of the real network.
pub struct ScriptedProbe {
    online_at: Option<Instant>,
}

impl ScriptedProbe {
    pub fn online() -> Self {
        Self {
            online_at: Some(Instant::now()),
        }
    }

    pub fn offline() -> Self {
        Self { online_at: None }
    }

    pub fn online_after(delay: Duration) -> Self {
        Self {
            online_at: Some(Instant::now() + delay),
        }
    }

    pub fn from_flags(offline: bool, online_after_ms: Option<u64>) -> Self {
        match (offline, online_after_ms) {
            (false, _) => Self::online(),
            (true, Some(ms)) => Self::online_after(Duration::from_millis(ms)),
            (true, None) => Self::offline(),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn wait_for_connection(&self, timeout: Duration) -> bool {
        let Some(online_at) = self.online_at else {
            sleep(timeout).await;
            return false;
        };

        let now = Instant::now();
        if online_at <= now {
            return true;
        }
        if online_at - now <= timeout {
            sleep_until(online_at).await;
            true
        } else {
            sleep(timeout).await;
            false
        }
    }
}

/// The error a `simulate` run replays, and how many times at once.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub category: ErrorCategory,
    pub status_code: Option<u16>,
    pub retry_after_ms: Option<u64>,
    pub calls: u32,
}

impl SimulationPlan {
    pub fn record(&self) -> ErrorRecord {
        let mut record = ErrorRecord::new(
            self.category,
            format!("simulated {} failure", self.category),
        );
        if let Some(code) = self.status_code {
            record = record.with_status_code(code);
        }
        if let Some(ms) = self.retry_after_ms {
            record = record.with_retry_after_ms(ms);
        }
        record
    }

    /// Fires every call at once; results come back in call order.
    pub async fn run(&self, orchestrator: &RecoveryOrchestrator) -> Vec<RecoveryResult> {
        let context = RecoveryContext::new().with("source", "simulate");
        let records: Vec<_> = (0..self.calls.max(1)).map(|_| self.record()).collect();
        let calls = records
            .iter()
            .map(|record| orchestrator.attempt_recovery(record, &context));
        join_all(calls).await
    }
}
