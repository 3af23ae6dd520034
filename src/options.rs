use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{RETRY_TIMES, RETRY_WAIT};

/// Delay schedule used between retries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same wait before every retry.
    #[default]
    Constant,
    /// Wait doubles after every retry.
    Exponential,
}

/// Configures the built-in [`Backoff`](crate::Backoff) retrier.
///
/// Missing fields fall back to [`RetryOptions::default`] when deserialising,
/// so the struct can be embedded in a larger host configuration file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    pub strategy: BackoffStrategy,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Wait before the first retry in milliseconds.
    pub wait_ms: u64,
    /// Upper bound for a single wait in milliseconds (exponential strategy).
    pub max_wait_ms: Option<u64>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Constant,
            max_retries: RETRY_TIMES,
            wait_ms: RETRY_WAIT.as_millis() as u64,
            max_wait_ms: None,
        }
    }
}

impl RetryOptions {
    /// Reads retry options from environment variables.
    ///
    /// Reads (all optional, defaults otherwise):
    /// - `RETRY_STRATEGY` — `constant` or `exponential`
    /// - `RETRY_MAX_RETRIES` — retries after the initial attempt
    /// - `RETRY_WAIT_MS` — first wait in milliseconds
    /// - `RETRY_MAX_WAIT_MS` — cap for a single wait in milliseconds
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(strategy) = lookup("RETRY_STRATEGY") {
            options.strategy = match strategy.trim().to_ascii_lowercase().as_str() {
                "constant" => BackoffStrategy::Constant,
                "exponential" => BackoffStrategy::Exponential,
                other => return Err(format!("unknown RETRY_STRATEGY '{other}'")),
            };
        }
        if let Some(value) = lookup("RETRY_MAX_RETRIES") {
            options.max_retries = parse_number("RETRY_MAX_RETRIES", &value)?;
        }
        if let Some(value) = lookup("RETRY_WAIT_MS") {
            options.wait_ms = parse_number("RETRY_WAIT_MS", &value)?;
        }
        if let Some(value) = lookup("RETRY_MAX_WAIT_MS") {
            options.max_wait_ms = Some(parse_number("RETRY_MAX_WAIT_MS", &value)?);
        }

        Ok(options)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> std::result::Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{key} must be a non-negative integer, got '{value}'"))
}

/// Configures the host [`Client`](crate::Client).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClientOptions {
    /// Deadline in milliseconds for a whole call, all attempts and waits
    /// included. `None` disables the deadline.
    pub timeout_ms: Option<u64>,
}

impl ClientOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
