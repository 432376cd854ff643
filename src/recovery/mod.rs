//! Automatic error recovery.
//!
//! A failure is classified into an [`ErrorRecord`], then the [`RecoveryOrchestrator`] gates the
//! attempt (enabled flag, global cooldown, concurrency cap), walks the category's strategies
//! in priority order and records the outcome.

mod builtin;
mod classifier;
mod cooldown;
mod executor;
mod gate;
mod handle;
mod ledger;
mod orchestrator;
mod provider;
mod registry;
mod strategy;
mod tracker;
mod types;

pub use builtin::{
    AuthenticationStrategy, BUILTIN_PRIORITY, BackoffStrategy, ConnectivityProbe,
    NON_RECOVERABLE_SERVER_STATUS, NetworkStrategy, TcpConnectivityProbe, TokenRefresher,
    builtin_strategies,
};
pub use classifier::{ErrorClassifier, MessageClassifier};
pub use cooldown::{Admission, CooldownTracker};
pub use executor::{StrategyExecutor, StrategyVerdict};
pub use gate::{ConcurrencyGate, GatePermit};
pub use handle::RecoveryHandle;
pub use ledger::{CategoryStats, LedgerEntry, RecoveryLedger, RecoveryStats};
pub use orchestrator::{RecoveryOrchestrator, RecoveryOrchestratorBuilder};
pub use provider::{StrategyProvider, load_enhanced};
pub use registry::StrategyRegistry;
pub use strategy::{BoxedStrategy, FnStrategy, FnStrategyBuilder, RecoveryStrategy, StrategyInfo};
pub use tracker::{AUTO_RECOVERY_ORIGIN, LogTracker, RecoveryTracker};
pub use types::{
    ErrorCategory, ErrorRecord, ErrorSeverity, MSG_AUTO_RECOVERY_DISABLED, MSG_COOLDOWN_ACTIVE,
    MSG_CONCURRENCY_EXHAUSTED, RecoveryContext, RecoveryOutcome, RecoveryResult,
};
