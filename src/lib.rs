pub mod cli;
pub mod config;
pub mod error;
pub mod recovery;

pub use config::{BuiltinStrategyConfig, LedgerConfig, OrchestratorConfig, PilotConfig};
pub use error::{RecoveryError, Result};
pub use recovery::{
    ErrorCategory, ErrorClassifier, ErrorRecord, ErrorSeverity, FnStrategy, RecoveryContext,
    RecoveryHandle, RecoveryOrchestrator, RecoveryOutcome, RecoveryResult, RecoveryStats,
    RecoveryStrategy,
};
