//! Configuration types and loading.
//!
//! - `PilotConfig`: top-level TOML configuration with validation
//! - `OrchestratorConfig`: gate, cooldown and escalation options
//! - `LedgerConfig`, `BuiltinStrategyConfig`: history cap and built-in strategy timings

mod settings;

pub use settings::{BuiltinStrategyConfig, LedgerConfig, OrchestratorConfig, PilotConfig};
