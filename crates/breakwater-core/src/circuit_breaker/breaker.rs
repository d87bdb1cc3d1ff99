//! Circuit breaker implementation

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::config::CircuitBreakerConfig;
use super::decorators::{FailurePredicate, RecordAllErrors};
use super::state_machine::StateMachine;
use super::types::{CircuitBreakerError, CircuitBreakerStats, CircuitState, StateTransition};
use crate::error::BreakwaterResult;

/// Circuit breaker for protecting against failing dependencies
///
/// All bookkeeping happens under one short, non-async lock, so a permission
/// check and the transition it triggers are never observed half-done, and
/// concurrent outcomes are never lost.
pub struct CircuitBreaker {
    /// Component name (for logging and metrics)
    name: String,
    /// Configuration
    config: CircuitBreakerConfig,
    /// Current state and active outcome tracker
    machine: Mutex<StateMachine>,
    /// Calls rejected while open
    not_permitted_calls: AtomicU64,
    /// Outcomes reported
    total_calls: AtomicU64,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a circuit breaker with the built-in defaults
    pub fn of_defaults(name: impl Into<String>) -> Self {
        Self::with_valid_config(name.into(), CircuitBreakerConfig::default())
    }

    /// Create a circuit breaker with a custom config
    ///
    /// Fails with [`BreakwaterError::Config`](crate::BreakwaterError::Config)
    /// when the threshold or ring buffer sizes are out of range.
    pub fn of(name: impl Into<String>, config: CircuitBreakerConfig) -> BreakwaterResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(name.into(), config))
    }

    fn with_valid_config(name: String, config: CircuitBreakerConfig) -> Self {
        tracing::debug!(
            circuit = %name,
            failure_rate_threshold = config.failure_rate_threshold,
            ring_buffer_size_in_closed_state = config.ring_buffer_size_in_closed_state,
            ring_buffer_size_in_half_open_state = config.ring_buffer_size_in_half_open_state,
            wait_duration_in_open_state = ?config.wait_duration_in_open_state,
            "Circuit breaker created"
        );
        Self {
            machine: Mutex::new(StateMachine::new(config.clone())),
            name,
            config,
            not_permitted_calls: AtomicU64::new(0),
            total_calls: AtomicU64::new(0),
        }
    }

    /// Get the component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state without evaluating any transition
    pub fn state(&self) -> CircuitState {
        self.machine.lock().state()
    }

    /// Check whether a call may proceed
    ///
    /// An OPEN breaker whose wait duration has elapsed moves to HALF_OPEN as
    /// part of this check and permits the call.
    pub fn is_call_permitted(&self) -> bool {
        let permit = self.machine.lock().try_acquire(Instant::now());
        if let Some(transition) = permit.transition {
            self.log_transition(transition);
        }
        if !permit.permitted {
            self.not_permitted_calls.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(circuit = %self.name, "Call not permitted, circuit breaker is open");
        }
        permit.permitted
    }

    /// Record a successful call
    pub fn on_success(&self, duration: Duration) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let transition = {
            let mut machine = self.machine.lock();
            if machine.state() == CircuitState::Open {
                None
            } else {
                machine.on_success(duration, Instant::now())
            }
        };
        if let Some(transition) = transition {
            self.log_transition(transition);
        }
    }

    /// Record a failed call
    pub fn on_error(&self, duration: Duration, cause: &dyn fmt::Display) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            circuit = %self.name,
            duration_ms = duration.as_millis() as u64,
            error = %cause,
            "Recording failed call"
        );
        let transition = {
            let mut machine = self.machine.lock();
            if machine.state() == CircuitState::Open {
                tracing::debug!(circuit = %self.name, "Ignoring outcome reported while open");
                None
            } else {
                machine.on_error(duration, Instant::now())
            }
        };
        if let Some(transition) = transition {
            self.log_transition(transition);
        }
    }

    /// Manually reset the circuit breaker to closed state
    pub fn reset(&self) {
        let transition = self.machine.lock().reset();
        tracing::info!(
            circuit = %self.name,
            from = %transition.from,
            "Circuit breaker reset"
        );
    }

    /// Manually open the circuit breaker
    pub fn trip(&self) {
        let transition = self.machine.lock().trip(Instant::now());
        tracing::info!(
            circuit = %self.name,
            from = %transition.from,
            "Circuit breaker forced open"
        );
    }

    /// Get circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let machine = self.machine.lock();
        let tracker = machine.tracker();
        CircuitBreakerStats {
            state: machine.state(),
            failure_rate: tracker.and_then(|t| t.failure_rate()),
            buffered_calls: tracker.map_or(0, |t| t.len()),
            max_buffered_calls: tracker.map_or(0, |t| t.capacity()),
            failed_calls: tracker.map_or(0, |t| t.failed_calls()),
            successful_calls: tracker.map_or(0, |t| t.successful_calls()),
            not_permitted_calls: self.not_permitted_calls.load(Ordering::Relaxed),
            total_calls: self.total_calls.load(Ordering::Relaxed),
            last_transition: machine.last_transition(),
        }
    }

    /// Execute an operation with circuit breaker protection
    pub fn execute<T, E, F>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        self.execute_with(&RecordAllErrors, operation)
    }

    /// Execute an async operation with circuit breaker protection
    ///
    /// Only the operation is awaited; the breaker never cancels it.
    pub async fn execute_async<T, E, F, Fut>(
        &self,
        operation: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if !self.is_call_permitted() {
            return Err(self.rejection());
        }

        let start = Instant::now();
        let result = operation().await;
        self.record_result(&RecordAllErrors, &result, start.elapsed());
        result.map_err(CircuitBreakerError::OperationFailed)
    }

    pub(crate) fn execute_with<T, E, F, P>(
        &self,
        predicate: &P,
        operation: F,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
        P: FailurePredicate<E> + ?Sized,
    {
        if !self.is_call_permitted() {
            return Err(self.rejection());
        }

        let start = Instant::now();
        let result = operation();
        self.record_result(predicate, &result, start.elapsed());
        result.map_err(CircuitBreakerError::OperationFailed)
    }

    fn record_result<T, E, P>(&self, predicate: &P, result: &Result<T, E>, elapsed: Duration)
    where
        E: fmt::Display,
        P: FailurePredicate<E> + ?Sized,
    {
        match result {
            Ok(_) => self.on_success(elapsed),
            Err(e) if predicate.is_failure(e) => self.on_error(elapsed, e),
            Err(e) => {
                tracing::trace!(circuit = %self.name, error = %e, "Error ignored by failure predicate");
                self.on_success(elapsed)
            }
        }
    }

    fn rejection<E>(&self) -> CircuitBreakerError<E> {
        CircuitBreakerError::Open {
            name: self.name.clone(),
        }
    }

    fn log_transition(&self, transition: StateTransition) {
        match transition.to {
            CircuitState::Open => tracing::warn!(
                circuit = %self.name,
                from = %transition.from,
                "Circuit breaker opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                circuit = %self.name,
                "Circuit breaker transitioning to half-open"
            ),
            CircuitState::Closed => tracing::info!(
                circuit = %self.name,
                from = %transition.from,
                "Circuit breaker closed"
            ),
        }
    }
}
