//! Default per-category strategies and the external hooks they depend on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use super::strategy::{BoxedStrategy, RecoveryStrategy};
use super::types::{ErrorCategory, ErrorRecord, RecoveryContext, RecoveryOutcome};
use crate::config::BuiltinStrategyConfig;
use crate::error::{RecoveryError, Result};

pub const BUILTIN_PRIORITY: i32 = 0;

/// Status code that the server backoff treats as a genuine bug rather than a transient fault.
pub const NON_RECOVERABLE_SERVER_STATUS: u16 = 500;

/// Low-level connectivity check used by the network strategy.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Resolves `true` as soon as the connection is usable, `false` once `timeout` elapses.
    async fn wait_for_connection(&self, timeout: Duration) -> bool;
}

/// Ambient credential refresh used by the authentication strategy.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// `Ok(false)` means the refresh was rejected (e.g. the refresh token is revoked).
    async fn refresh_token(&self) -> Result<bool>;
}

/// Polls a TCP connect to a well-known address until it succeeds or the timeout elapses.
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    address: String,
    interval: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(address: impl Into<String>, interval: Duration) -> Self {
        Self {
            address: address.into(),
            interval,
        }
    }

    pub fn from_config(config: &BuiltinStrategyConfig) -> Self {
        Self::new(
            config.probe_address.clone(),
            Duration::from_millis(config.probe_interval_ms),
        )
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn wait_for_connection(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }

            match timeout(remaining, TcpStream::connect(&self.address)).await {
                Ok(Ok(_)) => return true,
                Ok(Err(e)) => debug!(address = %self.address, error = %e, "Probe connect failed"),
                Err(_) => return false,
            }

            let pause = self
                .interval
                .min(deadline.saturating_duration_since(Instant::now()));
            if pause.is_zero() {
                return false;
            }
            sleep(pause).await;
        }
    }
}

/// Waits for connectivity to return; asks for another attempt while offline.
pub struct NetworkStrategy {
    probe: Arc<dyn ConnectivityProbe>,
    probe_timeout: Duration,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl NetworkStrategy {
    pub fn new(probe: Arc<dyn ConnectivityProbe>, config: &BuiltinStrategyConfig) -> Self {
        Self {
            probe,
            probe_timeout: Duration::from_millis(config.network_probe_timeout_ms),
            max_attempts: config.network_max_attempts,
            retry_delay_ms: config.network_retry_delay_ms,
        }
    }
}

#[async_trait]
impl RecoveryStrategy for NetworkStrategy {
    fn name(&self) -> &str {
        "network-connectivity"
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    async fn run(&self, _error: &ErrorRecord, _context: &RecoveryContext) -> Result<RecoveryOutcome> {
        if self.probe.wait_for_connection(self.probe_timeout).await {
            info!("Network connectivity restored");
            Ok(RecoveryOutcome::recovered("Network connection restored").with_should_retry(true))
        } else {
            Ok(RecoveryOutcome::retry_after(
                "Network still unavailable",
                self.retry_delay_ms,
            ))
        }
    }
}

/// Refreshes credentials through the configured hook.
///
/// Transient hook failures (I/O errors, a refresh exceeding its timeout) ask for another
/// attempt; a rejected refresh escalates and any other error is raised.
pub struct AuthenticationStrategy {
    refresher: Option<Arc<dyn TokenRefresher>>,
    refresh_timeout: Duration,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl AuthenticationStrategy {
    pub fn new(refresher: Option<Arc<dyn TokenRefresher>>, config: &BuiltinStrategyConfig) -> Self {
        Self {
            refresher,
            refresh_timeout: Duration::from_millis(config.token_refresh_timeout_ms),
            max_attempts: config.token_refresh_max_attempts,
            retry_delay_ms: config.token_refresh_retry_delay_ms,
        }
    }

    async fn refresh(&self, refresher: &dyn TokenRefresher) -> Result<bool> {
        match timeout(self.refresh_timeout, refresher.refresh_token()).await {
            Ok(result) => result,
            Err(_) => Err(RecoveryError::Timeout(format!(
                "token refresh exceeded {}ms",
                self.refresh_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl RecoveryStrategy for AuthenticationStrategy {
    fn name(&self) -> &str {
        "auth-token-refresh"
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    async fn run(&self, _error: &ErrorRecord, _context: &RecoveryContext) -> Result<RecoveryOutcome> {
        let Some(refresher) = &self.refresher else {
            return Ok(RecoveryOutcome::escalated(
                "No token refresh hook configured",
            ));
        };

        match self.refresh(refresher.as_ref()).await {
            Ok(true) => Ok(
                RecoveryOutcome::recovered("Authentication token refreshed").with_should_retry(true),
            ),
            Ok(false) => Ok(RecoveryOutcome::escalated(
                "Token refresh rejected, re-authentication required",
            )),
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Token refresh failed transiently");
                Ok(RecoveryOutcome::retry_after(
                    format!("Token refresh temporarily failed: {}", e),
                    self.retry_delay_ms,
                ))
            }
            Err(e @ RecoveryError::TokenRefresh(_)) => Err(e),
            Err(e) => Err(RecoveryError::TokenRefresh(e.to_string())),
        }
    }
}

/// Fixed wait before signalling that the operation may be retried.
///
/// Used for rate limits (honoring `retry_after_ms`), server errors, timeouts and
/// unavailable services.
pub struct BackoffStrategy {
    name: &'static str,
    delay: Duration,
    honor_retry_after: bool,
    non_recoverable_status: Option<u16>,
    message: &'static str,
}

impl BackoffStrategy {
    pub fn rate_limit(config: &BuiltinStrategyConfig) -> Self {
        Self {
            name: "rate-limit-wait",
            delay: Duration::from_millis(config.rate_limit_default_wait_ms),
            honor_retry_after: true,
            non_recoverable_status: None,
            message: "Rate limit window elapsed",
        }
    }

    pub fn server(config: &BuiltinStrategyConfig) -> Self {
        Self {
            name: "server-backoff",
            delay: Duration::from_millis(config.server_backoff_ms),
            honor_retry_after: false,
            non_recoverable_status: Some(NON_RECOVERABLE_SERVER_STATUS),
            message: "Server backoff complete",
        }
    }

    pub fn timeout(config: &BuiltinStrategyConfig) -> Self {
        Self {
            name: "timeout-backoff",
            delay: Duration::from_millis(config.timeout_delay_ms),
            honor_retry_after: false,
            non_recoverable_status: None,
            message: "Timeout backoff complete",
        }
    }

    pub fn service_unavailable(config: &BuiltinStrategyConfig) -> Self {
        Self {
            name: "service-unavailable-backoff",
            delay: Duration::from_millis(config.service_unavailable_delay_ms),
            honor_retry_after: true,
            non_recoverable_status: None,
            message: "Service availability wait complete",
        }
    }

    fn wait_for(&self, error: &ErrorRecord) -> Duration {
        if self.honor_retry_after {
            error.retry_after().unwrap_or(self.delay)
        } else {
            self.delay
        }
    }
}

#[async_trait]
impl RecoveryStrategy for BackoffStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    fn conditions(&self, error: &ErrorRecord, _context: &RecoveryContext) -> bool {
        self.non_recoverable_status.is_none() || error.status_code != self.non_recoverable_status
    }

    async fn run(&self, error: &ErrorRecord, _context: &RecoveryContext) -> Result<RecoveryOutcome> {
        let wait = self.wait_for(error);
        debug!(strategy = self.name, wait_ms = wait.as_millis() as u64, "Backing off");
        sleep(wait).await;

        Ok(RecoveryOutcome::recovered(format!(
            "{} after {}ms, ready to retry",
            self.message,
            wait.as_millis()
        ))
        .with_should_retry(true))
    }
}

/// One default strategy per category that has a sensible automatic remedy.
pub fn builtin_strategies(
    config: &BuiltinStrategyConfig,
    probe: Arc<dyn ConnectivityProbe>,
    refresher: Option<Arc<dyn TokenRefresher>>,
) -> Vec<(ErrorCategory, BoxedStrategy)> {
    vec![
        (
            ErrorCategory::Network,
            Arc::new(NetworkStrategy::new(probe, config)) as BoxedStrategy,
        ),
        (
            ErrorCategory::Authentication,
            Arc::new(AuthenticationStrategy::new(refresher, config)),
        ),
        (
            ErrorCategory::RateLimit,
            Arc::new(BackoffStrategy::rate_limit(config)),
        ),
        (ErrorCategory::Server, Arc::new(BackoffStrategy::server(config))),
        (
            ErrorCategory::Timeout,
            Arc::new(BackoffStrategy::timeout(config)),
        ),
        (
            ErrorCategory::ServiceUnavailable,
            Arc::new(BackoffStrategy::service_unavailable(config)),
        ),
    ]
}
