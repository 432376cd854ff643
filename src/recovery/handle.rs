use std::sync::Arc;

use super::ledger::RecoveryStats;
use super::orchestrator::RecoveryOrchestrator;
use super::strategy::StrategyInfo;
use super::types::{ErrorCategory, ErrorRecord, RecoveryContext, RecoveryResult};

/// Cheap, cloneable view of a shared orchestrator for components that only need to
/// request recoveries and read statistics.
#[derive(Clone)]
pub struct RecoveryHandle {
    orchestrator: Arc<RecoveryOrchestrator>,
}

impl RecoveryHandle {
    pub fn new(orchestrator: Arc<RecoveryOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn attempt_recovery(
        &self,
        error: &ErrorRecord,
        context: &RecoveryContext,
    ) -> RecoveryResult {
        self.orchestrator.attempt_recovery(error, context).await
    }

    pub fn strategies(&self, category: ErrorCategory) -> Vec<StrategyInfo> {
        self.orchestrator.describe_strategies(category)
    }

    pub fn success_rate(&self, category: ErrorCategory) -> f64 {
        self.orchestrator.success_rate(category)
    }

    pub fn stats(&self) -> RecoveryStats {
        self.orchestrator.stats()
    }

    pub fn clear_history(&self) {
        self.orchestrator.clear_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::recovery::strategy::FnStrategy;
    use crate::recovery::types::RecoveryOutcome;

    #[tokio::test]
    async fn test_clones_share_state() {
        let orchestrator = Arc::new(
            RecoveryOrchestrator::builder(OrchestratorConfig {
                global_cooldown_ms: 0,
                ..OrchestratorConfig::default()
            })
            .without_builtins()
            .without_tracker()
            .build(),
        );
        orchestrator.register_strategy(
            ErrorCategory::System,
            Arc::new(
                FnStrategy::builder("restart")
                    .priority(3)
                    .run(|_, _| async { Ok(RecoveryOutcome::recovered("restarted")) }),
            ),
        );

        let handle = orchestrator.handle();
        let other = handle.clone();
        let error = ErrorRecord::new(ErrorCategory::System, "crashed");

        assert!(handle.attempt_recovery(&error, &RecoveryContext::new()).await.success);
        assert_eq!(other.stats().total_attempts, 1);
        assert_eq!(other.strategies(ErrorCategory::System)[0].name, "restart");
        assert_eq!(other.success_rate(ErrorCategory::System), 1.0);

        other.clear_history();
        assert_eq!(handle.stats().total_attempts, 0);
    }
}
