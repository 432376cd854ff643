use tracing::{info, warn};

use super::registry::StrategyRegistry;
use super::strategy::BoxedStrategy;
use super::types::ErrorCategory;
use crate::error::Result;

/// Optional source of extra strategies, loaded once when the orchestrator is built.
pub trait StrategyProvider: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self) -> Result<Vec<(ErrorCategory, BoxedStrategy)>>;
}

/// Registers everything `provider` contributes. Load failures are logged and leave the
/// registry untouched.
pub fn load_enhanced(registry: &StrategyRegistry, provider: &dyn StrategyProvider) -> usize {
    match provider.load() {
        Ok(strategies) => {
            let count = strategies.len();
            registry.register_all(strategies);
            info!(
                provider = provider.name(),
                count, "Loaded enhanced recovery strategies"
            );
            count
        }
        Err(e) => {
            warn!(
                provider = provider.name(),
                error = %e,
                "Enhanced strategy provider failed to load, continuing with built-ins"
            );
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::RecoveryError;
    use crate::recovery::strategy::FnStrategy;
    use crate::recovery::types::RecoveryOutcome;

    struct Working;

    impl StrategyProvider for Working {
        fn name(&self) -> &str {
            "working"
        }

        fn load(&self) -> Result<Vec<(ErrorCategory, BoxedStrategy)>> {
            let strategy = FnStrategy::builder("enhanced-validation")
                .run(|_, _| async { Ok(RecoveryOutcome::failed("needs user input")) });
            Ok(vec![(ErrorCategory::Validation, Arc::new(strategy))])
        }
    }

    struct Broken;

    impl StrategyProvider for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn load(&self) -> Result<Vec<(ErrorCategory, BoxedStrategy)>> {
            Err(RecoveryError::ProviderLoad {
                provider: "broken".into(),
                message: "module missing".into(),
            })
        }
    }

    #[test]
    fn test_load_registers_strategies() {
        let registry = StrategyRegistry::new();
        assert_eq!(load_enhanced(&registry, &Working), 1);
        assert_eq!(registry.count(ErrorCategory::Validation), 1);
    }

    #[test]
    fn test_load_failure_is_not_fatal() {
        let registry = StrategyRegistry::new();
        assert_eq!(load_enhanced(&registry, &Broken), 0);
        assert!(registry.is_empty());
    }
}
