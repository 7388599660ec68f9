//! Canary hook configuration

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{HookError, Result};

/// Reserved isbn of the synthetic book; no real book uses it
pub const SENTINEL_ISBN: &str = "1-111-111-111";

/// Upper bound for a single retry backoff
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// How the sentinel record key is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelMode {
    /// The reserved isbn, as is
    Fixed,
    /// The reserved isbn suffixed with the hook execution id
    #[default]
    PerExecution,
}

impl SentinelMode {
    pub fn key(&self, hook_execution_id: &str) -> String {
        match self {
            SentinelMode::Fixed => SENTINEL_ISBN.to_string(),
            SentinelMode::PerExecution => format!("{}#{}", SENTINEL_ISBN, hook_execution_id),
        }
    }
}

impl FromStr for SentinelMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(SentinelMode::Fixed),
            "per-execution" | "per_execution" => Ok(SentinelMode::PerExecution),
            other => Err(format!(
                "unknown sentinel mode '{}' (expected 'fixed' or 'per-execution')",
                other
            )),
        }
    }
}

impl fmt::Display for SentinelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentinelMode::Fixed => write!(f, "fixed"),
            SentinelMode::PerExecution => write!(f, "per-execution"),
        }
    }
}

/// Canary hook configuration
#[derive(Debug, Clone)]
pub struct CanaryConfig {
    /// Candidate function version to invoke directly
    pub candidate_version: String,

    /// Table the candidate writes books to
    pub table: String,

    /// Fixed wait between invocation and the consistency read
    pub settle: Duration,

    /// Extra consistent reads after the first one comes back empty
    pub consistency_retries: u32,

    /// Backoff before the first extra read; doubles on each retry
    pub retry_backoff: Duration,

    pub sentinel_mode: SentinelMode,
}

impl CanaryConfig {
    pub fn new(candidate_version: impl Into<String>) -> Self {
        Self {
            candidate_version: candidate_version.into(),
            table: "books".to_string(),
            settle: Duration::from_millis(1500),
            consistency_retries: 0,
            retry_backoff: Duration::from_millis(500),
            sentinel_mode: SentinelMode::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - FN_NEW_VERSION (candidate version, default: local-candidate)
    /// - TABLE (optional, default: books)
    /// - CANARY_SETTLE_MS (optional, default: 1500)
    /// - CANARY_CONSISTENCY_RETRIES (optional, default: 0)
    /// - CANARY_RETRY_BACKOFF_MS (optional, default: 500)
    /// - CANARY_SENTINEL_MODE (optional, default: per-execution)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(version) = std::env::var("FN_NEW_VERSION") {
            config.candidate_version = version;
        }

        if let Ok(table) = std::env::var("TABLE") {
            config.table = table;
        }

        if let Some(ms) = env_number("CANARY_SETTLE_MS")? {
            config.settle = Duration::from_millis(ms);
        }

        if let Some(retries) = env_number("CANARY_CONSISTENCY_RETRIES")? {
            config.consistency_retries = u32::try_from(retries).map_err(|_| {
                HookError::Config("CANARY_CONSISTENCY_RETRIES is too large".to_string())
            })?;
        }

        if let Some(ms) = env_number("CANARY_RETRY_BACKOFF_MS")? {
            config.retry_backoff = Duration::from_millis(ms);
        }

        if let Ok(mode) = std::env::var("CANARY_SENTINEL_MODE") {
            config.sentinel_mode = mode.parse().map_err(HookError::Config)?;
        }

        Ok(config)
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_consistency_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.consistency_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_sentinel_mode(mut self, mode: SentinelMode) -> Self {
        self.sentinel_mode = mode;
        self
    }

    /// Backoff before retry number `attempt` (0-based), doubling and capped
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_BACKOFF)
            .min(MAX_RETRY_BACKOFF)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.candidate_version.trim().is_empty() {
            return Err(HookError::Config(
                "candidate_version (FN_NEW_VERSION) cannot be empty".to_string(),
            ));
        }

        if self.table.trim().is_empty() {
            return Err(HookError::Config("table cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self::new("local-candidate")
    }
}

fn env_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HookError::Config(format!("{} must be a non-negative integer", name))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanaryConfig::default();
        assert_eq!(config.table, "books");
        assert_eq!(config.settle, Duration::from_millis(1500));
        assert_eq!(config.consistency_retries, 0);
        assert_eq!(config.sentinel_mode, SentinelMode::PerExecution);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = CanaryConfig::new(" ");
        assert!(config.validate().is_err());

        let config = CanaryConfig::new("my-fn:2").with_table("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sentinel_keys() {
        assert_eq!(SentinelMode::Fixed.key("exec-1"), "1-111-111-111");
        assert_eq!(
            SentinelMode::PerExecution.key("exec-1"),
            "1-111-111-111#exec-1"
        );
    }

    #[test]
    fn test_sentinel_mode_parse() {
        assert_eq!("fixed".parse::<SentinelMode>(), Ok(SentinelMode::Fixed));
        assert_eq!(
            "Per-Execution".parse::<SentinelMode>(),
            Ok(SentinelMode::PerExecution)
        );
        assert!("random".parse::<SentinelMode>().is_err());
        assert_eq!(SentinelMode::PerExecution.to_string(), "per-execution");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = CanaryConfig::default()
            .with_consistency_retries(3, Duration::from_millis(100));
        assert_eq!(config.backoff_for(0), Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(200));
        assert_eq!(config.backoff_for(2), Duration::from_millis(400));
        assert_eq!(config.backoff_for(40), MAX_RETRY_BACKOFF);
    }
}
