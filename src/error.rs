use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy '{strategy}' failed: {message}")]
    Strategy { strategy: String, message: String },

    #[error("Strategy '{0}' panicked")]
    StrategyPanicked(String),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Strategy provider '{provider}' failed to load: {message}")]
    ProviderLoad { provider: String, message: String },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl RecoveryError {
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// Failures that may clear up on their own, such as I/O hiccups and timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, RecoveryError>;
