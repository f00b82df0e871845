//! Process settings loaded from environment variables.

use crate::region::PollPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default settle time between routing control updates (seconds).
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 7;
/// Default pause between global cluster status polls (seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default poll ceiling; 120 polls at 30s is one hour.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 120;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Orchestrator settings.
///
/// Read once at process start and passed explicitly to the components that
/// need them; nothing below this module reads the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Pause after each routing control update
    pub settle_delay: Duration,
    /// Pause between global cluster polls
    pub poll_interval: Duration,
    /// Poll ceiling, `None` polls until the cluster reports available
    pub poll_max_attempts: Option<u32>,
    /// Log output format
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Optional (with defaults):
    /// - `DELAY`: seconds between routing control updates (default: 7)
    /// - `DR_DB_POLL_INTERVAL_SECS`: seconds between cluster polls (default: 30)
    /// - `DR_DB_POLL_MAX_ATTEMPTS`: poll ceiling, 0 for unbounded (default: 120)
    /// - `DR_LOG_FORMAT`: `text` or `json` (default: text)
    pub fn from_env() -> Result<Self, ConfigError> {
        let settle_delay = read_u64("DELAY", DEFAULT_SETTLE_DELAY_SECS)?;
        let poll_interval = read_u64("DR_DB_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;

        let poll_max_attempts: u32 = std::env::var("DR_DB_POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| DEFAULT_POLL_MAX_ATTEMPTS.to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("DR_DB_POLL_MAX_ATTEMPTS", "must be a non-negative integer")
            })?;

        let log_format = match std::env::var("DR_LOG_FORMAT").as_deref() {
            Err(_) | Ok("text") => LogFormat::Text,
            Ok("json") => LogFormat::Json,
            Ok(_) => return Err(ConfigError::Invalid("DR_LOG_FORMAT", "must be text or json")),
        };

        Ok(Self {
            settle_delay: Duration::from_secs(settle_delay),
            poll_interval: Duration::from_secs(poll_interval),
            poll_max_attempts: (poll_max_attempts > 0).then_some(poll_max_attempts),
            log_format,
        })
    }

    /// Set the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the poll ceiling.
    pub fn with_poll_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.poll_max_attempts = attempts;
        self
    }

    /// Polling policy for the database failover controller.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_attempts: self.poll_max_attempts,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_max_attempts: Some(DEFAULT_POLL_MAX_ATTEMPTS),
            log_format: LogFormat::Text,
        }
    }
}

fn read_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, "must be a whole number of seconds")),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that touch the process environment
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = [
        "DELAY",
        "DR_DB_POLL_INTERVAL_SECS",
        "DR_DB_POLL_MAX_ATTEMPTS",
        "DR_LOG_FORMAT",
    ];

    /// Restores the touched variables on drop.
    struct EnvGuard {
        vars: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn clean() -> Self {
            let vars = VARS.iter().map(|k| (*k, env::var(k).ok())).collect();
            for key in VARS {
                env::remove_var(key);
            }
            Self { vars }
        }

        fn set(&self, key: &str, value: &str) {
            env::set_var(key, value);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let _guard = EnvGuard::clean();

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.settle_delay, Duration::from_secs(7));
        assert_eq!(settings.poll_max_attempts, Some(120));
    }

    #[test]
    fn test_overrides() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let guard = EnvGuard::clean();
        guard.set("DELAY", "3");
        guard.set("DR_DB_POLL_INTERVAL_SECS", "10");
        guard.set("DR_DB_POLL_MAX_ATTEMPTS", "0");
        guard.set("DR_LOG_FORMAT", "json");

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.settle_delay, Duration::from_secs(3));
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.poll_max_attempts, None);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_delay() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let guard = EnvGuard::clean();
        guard.set("DELAY", "soon");

        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains("DELAY"));
    }

    #[test]
    fn test_poll_policy_from_builder() {
        let policy = Settings::default()
            .with_poll_interval(Duration::from_secs(5))
            .with_poll_max_attempts(Some(4))
            .poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, Some(4));
    }
}
