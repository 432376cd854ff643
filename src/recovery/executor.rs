use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::cooldown::CooldownTracker;
use super::strategy::RecoveryStrategy;
use super::types::{ErrorRecord, RecoveryContext, RecoveryOutcome};
use crate::error::RecoveryError;

/// How a single strategy's attempt loop ended.
#[derive(Debug)]
pub enum StrategyVerdict<T> {
    /// `conditions` rejected the failure; the strategy never ran.
    Skipped,
    /// The strategy succeeded and, if an operation was supplied, re-running it succeeded too.
    Recovered {
        message: String,
        attempts: u32,
        should_retry: bool,
        value: Option<T>,
    },
    /// The strategy reported success but the re-verified operation still failed.
    Unverified { message: String, attempts: u32 },
    /// Attempts ran out, the strategy declined to retry, or its body raised.
    Failed {
        outcome: RecoveryOutcome,
        attempts: u32,
        raised: bool,
    },
}

/// Runs one strategy's bounded attempt loop.
pub struct StrategyExecutor {
    cooldowns: Arc<CooldownTracker>,
}

impl StrategyExecutor {
    pub fn new(cooldowns: Arc<CooldownTracker>) -> Self {
        Self { cooldowns }
    }

    pub async fn execute<T, V, Fut>(
        &self,
        strategy: &dyn RecoveryStrategy,
        error: &ErrorRecord,
        context: &RecoveryContext,
        verify: Option<&mut V>,
    ) -> StrategyVerdict<T>
    where
        V: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if !strategy.conditions(error, context) {
            debug!(
                category = %error.category,
                strategy = strategy.name(),
                "Strategy conditions not met, skipping"
            );
            return StrategyVerdict::Skipped;
        }

        let verdict = self.attempt_loop(strategy, error, context, verify).await;
        self.cooldowns
            .mark_strategy(error.category, strategy.name(), Instant::now());
        verdict
    }

    async fn attempt_loop<T, V, Fut>(
        &self,
        strategy: &dyn RecoveryStrategy,
        error: &ErrorRecord,
        context: &RecoveryContext,
        mut verify: Option<&mut V>,
    ) -> StrategyVerdict<T>
    where
        V: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let max_attempts = strategy.max_attempts().max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = match invoke(strategy, error, context).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        category = %error.category,
                        strategy = strategy.name(),
                        attempt,
                        error = %err,
                        "Recovery strategy raised"
                    );
                    return StrategyVerdict::Failed {
                        outcome: RecoveryOutcome::escalated(err.to_string()),
                        attempts: attempt,
                        raised: true,
                    };
                }
            };

            debug!(
                category = %error.category,
                strategy = strategy.name(),
                attempt,
                max_attempts,
                success = outcome.success,
                should_retry = outcome.should_retry,
                escalate = outcome.escalate,
                message = %outcome.message,
                "Strategy attempt finished"
            );

            if outcome.success {
                let Some(verify) = verify.as_deref_mut() else {
                    return StrategyVerdict::Recovered {
                        message: outcome.message,
                        attempts: attempt,
                        should_retry: outcome.should_retry,
                        value: None,
                    };
                };

                return match verify().await {
                    Some(value) => StrategyVerdict::Recovered {
                        message: outcome.message,
                        attempts: attempt,
                        should_retry: false,
                        value: Some(value),
                    },
                    None => {
                        info!(
                            category = %error.category,
                            strategy = strategy.name(),
                            "Strategy succeeded but operation still fails"
                        );
                        StrategyVerdict::Unverified {
                            message: outcome.message,
                            attempts: attempt,
                        }
                    }
                };
            }

            if outcome.should_retry && attempt < max_attempts {
                if let Some(delay) = outcome.next_attempt_delay() {
                    sleep(delay).await;
                }
                continue;
            }

            return StrategyVerdict::Failed {
                outcome,
                attempts: attempt,
                raised: false,
            };
        }
    }
}

/// Runs the strategy body, turning both errors and panics into `RecoveryError`.
async fn invoke(
    strategy: &dyn RecoveryStrategy,
    error: &ErrorRecord,
    context: &RecoveryContext,
) -> crate::error::Result<RecoveryOutcome> {
    match AssertUnwindSafe(strategy.run(error, context))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(_) => Err(RecoveryError::StrategyPanicked(strategy.name().to_string())),
    }
}
