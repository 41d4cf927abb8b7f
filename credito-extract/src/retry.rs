//! Retry/backoff as an explicit state machine.
//!
//! `advance` is pure: it maps the outcome of attempt `n` to the next state
//! and the wait (if any) that precedes it.

use std::time::Duration;

use crate::error::ExtractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryState<T> {
    /// Zero-based attempt about to run
    Attempting(u32),
    Success(T),
    FatalFailure(ExtractError),
    ExhaustedFailure(ExtractError),
}

/// Next state plus the wait required before entering it
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub next: RetryState<T>,
    pub wait: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before attempt `attempt + 1`: `base_delay * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn advance<T>(&self, attempt: u32, outcome: Result<T, ExtractError>) -> Transition<T> {
        let err = match outcome {
            Ok(value) => {
                return Transition {
                    next: RetryState::Success(value),
                    wait: None,
                };
            }
            Err(err) => err,
        };

        if !err.kind().is_retryable() {
            return Transition {
                next: RetryState::FatalFailure(err),
                wait: None,
            };
        }

        if attempt + 1 >= self.max_attempts {
            return Transition {
                next: RetryState::ExhaustedFailure(ExtractError::Exhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                }),
                wait: None,
            };
        }

        Transition {
            next: RetryState::Attempting(attempt + 1),
            wait: Some(self.backoff(attempt)),
        }
    }
}
