//! Command-line interface definitions.
//!
//! - `Cli`, `Commands`: argument definitions via clap
//! - `Display`: colored terminal output
//! - `OutputWriter`: JSON output for `--output json`
//! - `ScriptedProbe`: connectivity probe driven by `simulate` flags

mod commands;
mod display;
mod output;
mod simulate;

pub use commands::{Cli, Commands, ConfigAction, OutputFormat};
pub use display::Display;
pub use output::{OutputWriter, SimulationOutput};
pub use simulate::{ScriptedProbe, SimulationPlan};
