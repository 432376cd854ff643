use std::collections::HashMap;
use std::fmt;
use std::future::{Future, Ready};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::builtin::{ConnectivityProbe, TcpConnectivityProbe, TokenRefresher, builtin_strategies};
use super::classifier::{ErrorClassifier, MessageClassifier};
use super::cooldown::{Admission, CooldownTracker};
use super::executor::{StrategyExecutor, StrategyVerdict};
use super::gate::ConcurrencyGate;
use super::handle::RecoveryHandle;
use super::ledger::{LedgerEntry, RecoveryLedger, RecoveryStats};
use super::provider::{StrategyProvider, load_enhanced};
use super::registry::StrategyRegistry;
use super::strategy::{BoxedStrategy, StrategyInfo};
use super::tracker::{AUTO_RECOVERY_ORIGIN, LogTracker, RecoveryTracker};
use super::types::{ErrorCategory, ErrorRecord, RecoveryContext, RecoveryOutcome, RecoveryResult};
use crate::config::{BuiltinStrategyConfig, LedgerConfig, OrchestratorConfig, PilotConfig};

type NoVerify = fn() -> Ready<Option<()>>;

/// How the strategy list for one call played out.
enum StrategyRun<T> {
    Recovered(RecoveryResult, Option<T>),
    NothingInvoked,
    Exhausted(RecoveryOutcome),
}

/// Decides whether and how to repair a classified failure without caller involvement.
///
/// Safe to share across tasks; construct once in wiring code and pass around behind an `Arc`.
pub struct RecoveryOrchestrator {
    config: OrchestratorConfig,
    registry: StrategyRegistry,
    cooldowns: Arc<CooldownTracker>,
    gate: ConcurrencyGate,
    executor: StrategyExecutor,
    ledger: RecoveryLedger,
    tracker: Option<Arc<dyn RecoveryTracker>>,
    classifier: Arc<dyn ErrorClassifier>,
    consecutive_failures: Mutex<HashMap<ErrorCategory, u32>>,
}

impl RecoveryOrchestrator {
    pub fn builder(config: OrchestratorConfig) -> RecoveryOrchestratorBuilder {
        RecoveryOrchestratorBuilder::new(config)
    }

    /// Orchestrator with built-in strategies and the default TCP probe.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn from_config(config: &PilotConfig) -> RecoveryOrchestratorBuilder {
        Self::builder(config.orchestrator.clone())
            .ledger(config.ledger.clone())
            .builtin(config.builtin.clone())
    }

    pub fn handle(self: &Arc<Self>) -> RecoveryHandle {
        RecoveryHandle::new(Arc::clone(self))
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn ErrorClassifier {
        self.classifier.as_ref()
    }

    pub fn register_strategy(&self, category: ErrorCategory, strategy: BoxedStrategy) {
        self.registry.register(category, strategy);
    }

    pub fn strategies(&self, category: ErrorCategory) -> Vec<BoxedStrategy> {
        self.registry.list(category)
    }

    pub fn describe_strategies(&self, category: ErrorCategory) -> Vec<StrategyInfo> {
        self.registry.describe(category)
    }

    pub fn registered_categories(&self) -> Vec<ErrorCategory> {
        self.registry.categories()
    }

    pub fn stats(&self) -> RecoveryStats {
        self.ledger.stats()
    }

    pub fn success_rate(&self, category: ErrorCategory) -> f64 {
        self.ledger.success_rate(category)
    }

    pub fn history(&self) -> Vec<LedgerEntry> {
        self.ledger.entries()
    }

    /// Empties the ledger and failure counters. Cooldowns and the gate are left alone.
    pub fn clear_history(&self) {
        self.ledger.clear();
        self.consecutive_failures.lock().clear();
        debug!("Recovery history cleared");
    }

    pub fn active_recoveries(&self) -> u32 {
        self.gate.active()
    }

    pub async fn attempt_recovery(
        &self,
        error: &ErrorRecord,
        context: &RecoveryContext,
    ) -> RecoveryResult {
        self.recover::<(), NoVerify, _>(error, context, None)
            .await
            .0
    }

    /// Like `attempt_recovery`, but a strategy only counts as successful once re-running
    /// `operation` succeeds. Returns the operation's value on success.
    pub async fn attempt_recovery_with<T, E, F, Fut>(
        &self,
        error: &ErrorRecord,
        context: &RecoveryContext,
        mut operation: F,
    ) -> (RecoveryResult, Option<T>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut verify = || {
            let pending = operation();
            async move {
                match pending.await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        debug!(error = %e, "Operation still failing after strategy");
                        None
                    }
                }
            }
        };
        self.recover(error, context, Some(&mut verify)).await
    }

    /// Runs `operation`; on failure classifies the error and attempts recovery with the
    /// operation as re-verification. A failed recovery returns the original error.
    pub async fn with_auto_recovery<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let record = self.classifier.classify(&err);
        debug!(
            error_id = %record.id,
            category = %record.category,
            "Operation failed, attempting automatic recovery"
        );

        let (result, value) = self
            .attempt_recovery_with(&record, &RecoveryContext::new(), &mut operation)
            .await;

        match value {
            Some(value) if result.success => Ok(value),
            _ => Err(err),
        }
    }

    async fn recover<T, V, Fut>(
        &self,
        error: &ErrorRecord,
        context: &RecoveryContext,
        verify: Option<&mut V>,
    ) -> (RecoveryResult, Option<T>)
    where
        V: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if !self.config.enable_auto_recovery {
            debug!(category = %error.category, "Auto-recovery disabled");
            return (RecoveryResult::disabled(), None);
        }

        let started = Instant::now();
        let permit = match self.cooldowns.admit(started, || self.gate.try_acquire()) {
            Admission::Admitted(permit) => permit,
            Admission::CoolingDown(remaining) => {
                debug!(
                    category = %error.category,
                    remaining_ms = remaining.as_millis() as u64,
                    "Recovery cooldown active"
                );
                return (RecoveryResult::cooldown_active(), None);
            }
            Admission::Saturated => {
                warn!(
                    category = %error.category,
                    capacity = self.gate.capacity(),
                    "Maximum concurrent recoveries reached"
                );
                return (RecoveryResult::concurrency_exhausted(), None);
            }
        };

        let run = self.run_strategies(error, context, verify).await;
        drop(permit);

        let (result, value) = self.settle(error.category, run);
        let duration = started.elapsed();
        self.cooldowns.mark_global(Instant::now());

        if self.config.tracking_enabled {
            self.ledger.record(LedgerEntry::new(
                error.category,
                result.success,
                result.escalate,
                duration,
            ));
            if let Some(tracker) = &self.tracker {
                tracker
                    .record_attempt(
                        error,
                        AUTO_RECOVERY_ORIGIN,
                        result.success,
                        result.escalate,
                        duration,
                    )
                    .await;
            }
        }

        (result, value)
    }

    fn eligible(&self, category: ErrorCategory) -> Vec<BoxedStrategy> {
        let now = Instant::now();
        self.registry
            .list(category)
            .into_iter()
            .filter(|strategy| {
                if !strategy.can_recover() {
                    debug!(%category, strategy = strategy.name(), "Strategy marked non-recoverable");
                    return false;
                }
                let ready =
                    self.cooldowns
                        .strategy_ready(category, strategy.name(), strategy.cooldown(), now);
                if !ready {
                    debug!(%category, strategy = strategy.name(), "Strategy in cooldown, skipping");
                }
                ready
            })
            .collect()
    }

    async fn run_strategies<T, V, Fut>(
        &self,
        error: &ErrorRecord,
        context: &RecoveryContext,
        mut verify: Option<&mut V>,
    ) -> StrategyRun<T>
    where
        V: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut last: Option<RecoveryOutcome> = None;

        for strategy in self.eligible(error.category) {
            let verdict = self
                .executor
                .execute(strategy.as_ref(), error, context, verify.as_deref_mut())
                .await;

            match verdict {
                StrategyVerdict::Skipped => {}
                StrategyVerdict::Recovered {
                    message,
                    attempts,
                    should_retry,
                    value,
                } => {
                    info!(
                        category = %error.category,
                        strategy = strategy.name(),
                        attempts,
                        "Recovery succeeded"
                    );
                    let result = RecoveryResult {
                        should_retry,
                        ..RecoveryResult::recovered(message)
                    };
                    return StrategyRun::Recovered(result, value);
                }
                StrategyVerdict::Unverified { message, .. } => {
                    last = Some(RecoveryOutcome::retry(format!(
                        "{}, but the operation still fails",
                        message
                    )));
                }
                StrategyVerdict::Failed {
                    outcome,
                    attempts,
                    raised,
                } => {
                    debug!(
                        category = %error.category,
                        strategy = strategy.name(),
                        attempts,
                        raised,
                        "Strategy exhausted"
                    );
                    last = Some(outcome);
                }
            }
        }

        match last {
            Some(last) => StrategyRun::Exhausted(last),
            None => StrategyRun::NothingInvoked,
        }
    }

    /// Applies the escalation policy and updates the per-category failure streak.
    ///
    /// Exhaustion always escalates. Once the streak reaches `escalation_threshold` the
    /// retry hint is withdrawn until a recovery for the category succeeds.
    fn settle<T>(&self, category: ErrorCategory, run: StrategyRun<T>) -> (RecoveryResult, Option<T>) {
        match run {
            StrategyRun::Recovered(result, value) => {
                self.consecutive_failures.lock().remove(&category);
                (result, value)
            }
            StrategyRun::NothingInvoked => {
                self.bump_failures(category);
                warn!(%category, "No recovery strategies available");
                (RecoveryResult::no_strategies(category), None)
            }
            StrategyRun::Exhausted(last) => {
                let failures = self.bump_failures(category);
                let streak_exceeded = failures >= self.config.escalation_threshold;
                let result = RecoveryResult::failed(
                    format!("Recovery failed for {}: {}", category, last.message),
                    last.should_retry && !streak_exceeded,
                    true,
                );
                warn!(
                    %category,
                    consecutive_failures = failures,
                    should_retry = result.should_retry,
                    message = %result.message,
                    "Recovery exhausted"
                );
                (result, None)
            }
        }
    }

    fn bump_failures(&self, category: ErrorCategory) -> u32 {
        let mut failures = self.consecutive_failures.lock();
        let count = failures.entry(category).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}

pub struct RecoveryOrchestratorBuilder {
    config: OrchestratorConfig,
    ledger: LedgerConfig,
    builtin: BuiltinStrategyConfig,
    include_builtins: bool,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    tracker: Option<Arc<dyn RecoveryTracker>>,
    classifier: Option<Arc<dyn ErrorClassifier>>,
    provider: Option<Arc<dyn StrategyProvider>>,
}

impl RecoveryOrchestratorBuilder {
    fn new(config: OrchestratorConfig) -> Self {
        Self {
            config,
            ledger: LedgerConfig::default(),
            builtin: BuiltinStrategyConfig::default(),
            include_builtins: true,
            probe: None,
            refresher: None,
            tracker: Some(Arc::new(LogTracker)),
            classifier: None,
            provider: None,
        }
    }

    pub fn ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn builtin(mut self, builtin: BuiltinStrategyConfig) -> Self {
        self.builtin = builtin;
        self
    }

    /// Start from an empty registry.
    pub fn without_builtins(mut self) -> Self {
        self.include_builtins = false;
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn tracker(mut self, tracker: Arc<dyn RecoveryTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn without_tracker(mut self) -> Self {
        self.tracker = None;
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn StrategyProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> RecoveryOrchestrator {
        let registry = StrategyRegistry::new();

        if self.include_builtins {
            let probe = self
                .probe
                .unwrap_or_else(|| Arc::new(TcpConnectivityProbe::from_config(&self.builtin)));
            registry.register_all(builtin_strategies(&self.builtin, probe, self.refresher));
        }

        if let Some(provider) = &self.provider {
            load_enhanced(&registry, provider.as_ref());
        }

        let cooldowns = Arc::new(CooldownTracker::new(self.config.global_cooldown()));

        info!(
            max_concurrent = self.config.max_concurrent_recoveries,
            global_cooldown_ms = self.config.global_cooldown_ms,
            enabled = self.config.enable_auto_recovery,
            strategies = registry.len(),
            "Recovery orchestrator initialized"
        );

        RecoveryOrchestrator {
            gate: ConcurrencyGate::new(self.config.max_concurrent_recoveries),
            executor: StrategyExecutor::new(Arc::clone(&cooldowns)),
            cooldowns,
            registry,
            ledger: RecoveryLedger::new(self.ledger.max_entries),
            tracker: self.tracker,
            classifier: self
                .classifier
                .unwrap_or_else(|| Arc::new(MessageClassifier)),
            consecutive_failures: Mutex::new(HashMap::new()),
            config: self.config,
        }
    }
}
