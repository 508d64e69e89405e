//! Gateway boundary types: uniform errors and retry policy.
//!
//! # Invariants
//! - Every collaborator failure leaves a gateway as a `GatewayError`.
//! - Only transient store failures are retried; backoff is capped.

use crate::config::RetryConfig;
use crate::logging::sanitize_for_log;
use crate::store::{StoreError, StoreResult};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Identity provider rejected the request (bad credentials, email in use, ...).
    Auth,
    NotFound,
    PermissionDenied,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Unknown => "unknown",
        }
    }
}

/// Tagged failure returned by gateway operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("{what} not found"))
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl Error for GatewayError {}

impl From<StoreError> for GatewayError {
    fn from(value: StoreError) -> Self {
        let kind = match &value {
            StoreError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            StoreError::Db(_)
            | StoreError::Json(_)
            | StoreError::InvalidInput(_)
            | StoreError::Unavailable(_) => ErrorKind::Unknown,
        };
        Self::new(kind, value.to_string())
    }
}

/// Exponential backoff for transient store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }

    /// Retries without sleeping; for tests and in-process stores.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op`, retrying transient failures up to the attempt budget.
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> StoreResult<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "event=store_retry module=gateway status=retry op={} attempt={} delay_ms={} error={}",
                        operation,
                        attempt,
                        delay.as_millis(),
                        sanitize_for_log(&err.to_string())
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, GatewayError, RetryPolicy};
    use crate::config::RetryConfig;
    use crate::store::StoreError;
    use std::time::Duration;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 300,
        });
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(30), Duration::from_millis(300));
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result = policy.run("test", || {
            calls += 1;
            if calls < 3 {
                Err(StoreError::Unavailable("busy".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result: Result<(), _> = policy.run("test", || {
            calls += 1;
            Err(StoreError::PermissionDenied("rules".to_string()))
        });
        assert_eq!(calls, 1);
        assert_eq!(GatewayError::from(result.unwrap_err()).kind, ErrorKind::PermissionDenied);
    }

    #[test]
    fn retry_budget_is_bounded() {
        let policy = RetryPolicy::immediate(2);
        let mut calls = 0;
        let result: Result<(), _> = policy.run("test", || {
            calls += 1;
            Err(StoreError::Unavailable("down".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);
    }
}
