//! Circuit breaker types

use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Circuit is closed, operations proceed normally
    Closed,
    /// Circuit is open, operations are rejected
    Open,
    /// Circuit is half-open, probe operations decide whether to close again
    HalfOpen,
}

impl CircuitState {
    /// Upper-case label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state change caused by a permission check, an outcome or an override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: CircuitState,
    pub to: CircuitState,
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Error returned by a call routed through a circuit breaker
///
/// `OperationFailed` holds the wrapped operation's own error untouched, so
/// callers can always tell a policy rejection apart from a real failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitBreakerError<E> {
    /// The breaker rejected the call without invoking the operation
    #[error("Circuit breaker '{name}' is open and does not permit further calls")]
    Open { name: String },

    /// The operation ran and failed
    #[error("{0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    /// Whether the call was rejected by the breaker
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// Name of the rejecting breaker
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Open { name } => Some(name),
            Self::OperationFailed(_) => None,
        }
    }

    /// The wrapped operation's error, if the operation ran
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Open { .. } => None,
            Self::OperationFailed(e) => Some(e),
        }
    }

    /// Borrow the wrapped operation's error, if the operation ran
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Open { .. } => None,
            Self::OperationFailed(e) => Some(e),
        }
    }
}

/// Point-in-time statistics for a circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    /// Failure rate of the active ring buffer, `None` until it is full
    pub failure_rate: Option<u8>,
    pub buffered_calls: usize,
    pub max_buffered_calls: usize,
    pub failed_calls: usize,
    pub successful_calls: usize,
    /// Calls rejected since creation
    pub not_permitted_calls: u64,
    /// Outcomes recorded since creation
    pub total_calls: u64,
    pub last_transition: Option<Instant>,
}
