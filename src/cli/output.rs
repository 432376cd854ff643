use std::io::{self, Write};

use serde::Serialize;

use super::OutputFormat;
use crate::recovery::{RecoveryResult, RecoveryStats};

/// Writes machine-readable results when `--output json` is selected.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    pub fn emit_json<T: Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }

    /// Emit a simple message.
    pub fn emit_message(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => self.emit_json(&MessageOutput {
                message: message.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageOutput {
    message: String,
}

/// JSON document produced by `simulate`.
#[derive(Debug, Serialize)]
pub struct SimulationOutput {
    pub results: Vec<RecoveryResult>,
    pub stats: RecoveryStats,
    pub elapsed_ms: u64,
}
