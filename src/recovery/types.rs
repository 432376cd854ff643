use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecoveryError;

pub const MSG_AUTO_RECOVERY_DISABLED: &str = "Auto-recovery disabled";
pub const MSG_COOLDOWN_ACTIVE: &str = "Recovery cooldown active";
pub const MSG_CONCURRENCY_EXHAUSTED: &str = "Maximum concurrent recoveries reached";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Authentication,
    RateLimit,
    Server,
    Timeout,
    ServiceUnavailable,
    Validation,
    System,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 9] = [
        Self::Network,
        Self::Authentication,
        Self::RateLimit,
        Self::Server,
        Self::Timeout,
        Self::ServiceUnavailable,
        Self::Validation,
        Self::System,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Server => "server",
            Self::Timeout => "timeout",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Validation => "validation",
            Self::System => "system",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = RecoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| RecoveryError::Other(format!("Unknown error category: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A classified failure. Produced by an `ErrorClassifier`, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ErrorRecord {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            id: format!("err-{}", &uuid::Uuid::new_v4().to_string()[..8]),
            category,
            severity: ErrorSeverity::default(),
            message: message.into(),
            timestamp: Utc::now(),
            retry_after_ms: None,
            status_code: None,
        }
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_retry_after_ms(mut self, retry_after_ms: u64) -> Self {
        self.retry_after_ms = Some(retry_after_ms);
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_ms.map(Duration::from_millis)
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)?;
        if let Some(code) = self.status_code {
            write!(f, " (status {})", code)?;
        }
        Ok(())
    }
}

/// Caller-supplied data handed unchanged to strategy conditions and bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecoveryContext(HashMap<String, Value>);

impl RecoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, Value>> for RecoveryContext {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Result of a single strategy invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryOutcome {
    pub success: bool,
    pub message: String,
    pub should_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_attempt_delay_ms: Option<u64>,
    pub escalate: bool,
}

impl RecoveryOutcome {
    pub fn recovered(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_retry: false,
            next_attempt_delay_ms: None,
            escalate: false,
        }
    }

    /// Not yet recovered; another attempt within the same strategy is worthwhile.
    pub fn retry(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            should_retry: true,
            next_attempt_delay_ms: None,
            escalate: false,
        }
    }

    pub fn retry_after(message: impl Into<String>, delay_ms: u64) -> Self {
        Self {
            next_attempt_delay_ms: Some(delay_ms),
            ..Self::retry(message)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            should_retry: false,
            next_attempt_delay_ms: None,
            escalate: false,
        }
    }

    pub fn escalated(message: impl Into<String>) -> Self {
        Self {
            escalate: true,
            ..Self::failed(message)
        }
    }

    pub fn with_should_retry(mut self, should_retry: bool) -> Self {
        self.should_retry = should_retry;
        self
    }

    pub fn next_attempt_delay(&self) -> Option<Duration> {
        self.next_attempt_delay_ms.map(Duration::from_millis)
    }
}

/// Final answer of one `attempt_recovery` call.
///
/// Consumers should treat `escalate` as "stop retrying automatically and surface to the user",
/// and `should_retry` without `escalate` as "safe to retry later".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub success: bool,
    pub message: String,
    pub should_retry: bool,
    pub escalate: bool,
}

impl RecoveryResult {
    pub fn recovered(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_retry: false,
            escalate: false,
        }
    }

    pub fn failed(message: impl Into<String>, should_retry: bool, escalate: bool) -> Self {
        Self {
            success: false,
            message: message.into(),
            should_retry,
            escalate,
        }
    }

    pub fn disabled() -> Self {
        Self::failed(MSG_AUTO_RECOVERY_DISABLED, false, false)
    }

    pub fn cooldown_active() -> Self {
        Self::failed(MSG_COOLDOWN_ACTIVE, true, false)
    }

    pub fn concurrency_exhausted() -> Self {
        Self::failed(MSG_CONCURRENCY_EXHAUSTED, true, false)
    }

    pub fn no_strategies(category: ErrorCategory) -> Self {
        Self::failed(
            format!("No recovery strategies available for {}", category),
            false,
            true,
        )
    }

    /// Gating rejections (disabled, cooldown, concurrency) never reached a strategy.
    pub fn is_gated(&self) -> bool {
        !self.success
            && matches!(
                self.message.as_str(),
                MSG_AUTO_RECOVERY_DISABLED | MSG_COOLDOWN_ACTIVE | MSG_CONCURRENCY_EXHAUSTED
            )
    }
}
