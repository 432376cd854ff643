//! Recovery strategy trait and a closure-backed implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::types::{ErrorRecord, RecoveryContext, RecoveryOutcome};
use crate::error::Result;

/// A registered remediation procedure for one error category.
///
/// Strategies run concurrently from unrelated call sites, so `run` must be safe to invoke
/// repeatedly and in parallel.
#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    /// Stable identity, also the per-strategy cooldown key within a category.
    ///
    /// Names must be unique within a category: two strategies sharing a name there also
    /// share one cooldown window.
    fn name(&self) -> &str;

    /// Static eligibility. `false` removes the strategy from selection entirely.
    fn can_recover(&self) -> bool {
        true
    }

    fn max_attempts(&self) -> u32 {
        1
    }

    /// Higher runs first.
    fn priority(&self) -> i32 {
        0
    }

    /// Minimum spacing between two uses of this strategy for the same category.
    fn cooldown(&self) -> Option<Duration> {
        None
    }

    /// Dynamic eligibility for a specific failure.
    fn conditions(&self, _error: &ErrorRecord, _context: &RecoveryContext) -> bool {
        true
    }

    async fn run(&self, error: &ErrorRecord, context: &RecoveryContext) -> Result<RecoveryOutcome>;
}

pub type BoxedStrategy = Arc<dyn RecoveryStrategy>;

/// Serializable description of a registered strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub priority: i32,
    pub max_attempts: u32,
    pub can_recover: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
}

impl StrategyInfo {
    pub fn of(strategy: &dyn RecoveryStrategy) -> Self {
        Self {
            name: strategy.name().to_string(),
            priority: strategy.priority(),
            max_attempts: strategy.max_attempts(),
            can_recover: strategy.can_recover(),
            cooldown_ms: strategy.cooldown().map(|d| d.as_millis() as u64),
        }
    }
}

type ConditionFn = dyn Fn(&ErrorRecord, &RecoveryContext) -> bool + Send + Sync;
type BodyFn = dyn Fn(ErrorRecord, RecoveryContext) -> BoxFuture<'static, Result<RecoveryOutcome>>
    + Send
    + Sync;

/// Strategy assembled from closures, for callers that don't want a dedicated type.
///
/// ```rust,no_run
/// use recovery_pilot::recovery::{FnStrategy, RecoveryOutcome};
///
/// let strategy = FnStrategy::builder("reconnect-pool")
///     .priority(20)
///     .max_attempts(3)
///     .when(|_error, ctx| ctx.get_bool("pooled").unwrap_or(false))
///     .run(|_error, _ctx| async move { Ok(RecoveryOutcome::recovered("Pool reconnected")) });
/// ```
#[derive(Clone)]
pub struct FnStrategy {
    name: String,
    can_recover: bool,
    max_attempts: u32,
    priority: i32,
    cooldown: Option<Duration>,
    condition: Option<Arc<ConditionFn>>,
    body: Arc<BodyFn>,
}

impl FnStrategy {
    pub fn builder(name: impl Into<String>) -> FnStrategyBuilder {
        FnStrategyBuilder {
            name: name.into(),
            can_recover: true,
            max_attempts: 1,
            priority: 0,
            cooldown: None,
            condition: None,
        }
    }
}

impl fmt::Debug for FnStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy")
            .field("name", &self.name)
            .field("can_recover", &self.can_recover)
            .field("max_attempts", &self.max_attempts)
            .field("priority", &self.priority)
            .field("cooldown", &self.cooldown)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

#[async_trait]
impl RecoveryStrategy for FnStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_recover(&self) -> bool {
        self.can_recover
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn cooldown(&self) -> Option<Duration> {
        self.cooldown
    }

    fn conditions(&self, error: &ErrorRecord, context: &RecoveryContext) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition(error, context))
    }

    async fn run(&self, error: &ErrorRecord, context: &RecoveryContext) -> Result<RecoveryOutcome> {
        (self.body)(error.clone(), context.clone()).await
    }
}

pub struct FnStrategyBuilder {
    name: String,
    can_recover: bool,
    max_attempts: u32,
    priority: i32,
    cooldown: Option<Duration>,
    condition: Option<Arc<ConditionFn>>,
}

impl FnStrategyBuilder {
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Clamped to at least one attempt.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn can_recover(mut self, can_recover: bool) -> Self {
        self.can_recover = can_recover;
        self
    }

    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ErrorRecord, &RecoveryContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn run<F, Fut>(self, body: F) -> FnStrategy
    where
        F: Fn(ErrorRecord, RecoveryContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RecoveryOutcome>> + Send + 'static,
    {
        FnStrategy {
            name: self.name,
            can_recover: self.can_recover,
            max_attempts: self.max_attempts,
            priority: self.priority,
            cooldown: self.cooldown,
            condition: self.condition,
            body: Arc::new(move |error, context| body(error, context).boxed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::types::ErrorCategory;

    #[tokio::test]
    async fn test_fn_strategy_runs_body() {
        let strategy = FnStrategy::builder("echo")
            .priority(5)
            .max_attempts(0)
            .run(|error, _ctx| async move { Ok(RecoveryOutcome::recovered(error.message)) });

        assert_eq!(strategy.max_attempts(), 1);
        assert_eq!(strategy.priority(), 5);

        let error = ErrorRecord::new(ErrorCategory::System, "disk hiccup");
        let outcome = strategy
            .run(&error, &RecoveryContext::new())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message, "disk hiccup");
    }

    #[test]
    fn test_fn_strategy_condition() {
        let strategy = FnStrategy::builder("guarded")
            .when(|_, ctx| ctx.get_bool("allowed").unwrap_or(false))
            .run(|_, _| async { Ok(RecoveryOutcome::recovered("ok")) });

        let error = ErrorRecord::new(ErrorCategory::System, "x");
        assert!(!strategy.conditions(&error, &RecoveryContext::new()));
        assert!(strategy.conditions(&error, &RecoveryContext::new().with("allowed", true)));
    }

    #[test]
    fn test_strategy_info() {
        let strategy = FnStrategy::builder("slow")
            .cooldown(Duration::from_millis(250))
            .can_recover(false)
            .run(|_, _| async { Ok(RecoveryOutcome::failed("nope")) });

        let info = StrategyInfo::of(&strategy);
        assert_eq!(info.name, "slow");
        assert_eq!(info.cooldown_ms, Some(250));
        assert!(!info.can_recover);
    }
}
