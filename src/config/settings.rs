use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{RecoveryError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub orchestrator: OrchestratorConfig,
    pub ledger: LedgerConfig,
    pub builtin: BuiltinStrategyConfig,
}

impl PilotConfig {
    /// Loads the config file at `path`, falling back to defaults when it does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let orch = &self.orchestrator;
        if orch.max_concurrent_recoveries == 0 {
            errors.push("orchestrator.max_concurrent_recoveries must be greater than 0");
        }
        if orch.escalation_threshold == 0 {
            errors.push("orchestrator.escalation_threshold must be greater than 0");
        }

        if self.ledger.max_entries == 0 {
            errors.push("ledger.max_entries must be greater than 0");
        }

        let builtin = &self.builtin;
        if builtin.network_max_attempts == 0 {
            errors.push("builtin.network_max_attempts must be greater than 0");
        }
        if builtin.probe_interval_ms == 0 {
            errors.push("builtin.probe_interval_ms must be greater than 0");
        }
        if builtin.probe_address.trim().is_empty() {
            errors.push("builtin.probe_address must not be empty");
        }
        if builtin.token_refresh_max_attempts == 0 {
            errors.push("builtin.token_refresh_max_attempts must be greater than 0");
        }
        if builtin.token_refresh_timeout_ms == 0 {
            errors.push("builtin.token_refresh_timeout_ms must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RecoveryError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Construction-time options for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_concurrent_recoveries: u32,
    pub global_cooldown_ms: u64,
    pub enable_auto_recovery: bool,
    /// Consecutive failed recoveries per category after which results stop suggesting a retry.
    pub escalation_threshold: u32,
    pub tracking_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_recoveries: 3,
            global_cooldown_ms: 1000,
            enable_auto_recovery: true,
            escalation_threshold: 3,
            tracking_enabled: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn global_cooldown(&self) -> Duration {
        Duration::from_millis(self.global_cooldown_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub max_entries: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { max_entries: 100 }
    }
}

/// Timings used by the built-in per-category strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinStrategyConfig {
    pub network_probe_timeout_ms: u64,
    pub network_max_attempts: u32,
    pub network_retry_delay_ms: u64,
    pub probe_address: String,
    pub probe_interval_ms: u64,
    /// Upper bound on one token refresh call; exceeding it counts as a transient failure.
    pub token_refresh_timeout_ms: u64,
    pub token_refresh_max_attempts: u32,
    pub token_refresh_retry_delay_ms: u64,
    pub rate_limit_default_wait_ms: u64,
    pub server_backoff_ms: u64,
    pub timeout_delay_ms: u64,
    pub service_unavailable_delay_ms: u64,
}

impl Default for BuiltinStrategyConfig {
    fn default() -> Self {
        Self {
            network_probe_timeout_ms: 10_000,
            network_max_attempts: 3,
            network_retry_delay_ms: 2_000,
            probe_address: "1.1.1.1:53".to_string(),
            probe_interval_ms: 500,
            token_refresh_timeout_ms: 10_000,
            token_refresh_max_attempts: 2,
            token_refresh_retry_delay_ms: 1_000,
            rate_limit_default_wait_ms: 60_000,
            server_backoff_ms: 2_000,
            timeout_delay_ms: 1_000,
            service_unavailable_delay_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PilotConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = PilotConfig::default();
        config.orchestrator.max_concurrent_recoveries = 0;
        config.ledger.max_entries = 0;
        config.builtin.token_refresh_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_concurrent_recoveries"));
        assert!(err.contains("ledger.max_entries"));
        assert!(err.contains("builtin.token_refresh_timeout_ms"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PilotConfig = toml::from_str(
            r#"
            [orchestrator]
            max_concurrent_recoveries = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.orchestrator.max_concurrent_recoveries, 7);
        assert_eq!(config.orchestrator.global_cooldown_ms, 1000);
        assert_eq!(config.ledger.max_entries, 100);
        assert_eq!(config.builtin.server_backoff_ms, 2_000);
    }
}
