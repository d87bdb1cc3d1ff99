//! Decorators that route calls through a circuit breaker
//!
//! Two shapes are supported: a zero-argument operation ([`DecoratedSupplier`])
//! and a one-argument transform ([`DecoratedFunction`]). Both go through the
//! same permission check and outcome recording; only the invocation differs.
//!
//! ```
//! use std::sync::Arc;
//! use breakwater_core::circuit_breaker::{decorate_supplier, CircuitBreaker};
//!
//! let breaker = Arc::new(CircuitBreaker::of_defaults("greeter"));
//! let hello = decorate_supplier(&breaker, || Ok::<_, std::io::Error>("Hello"));
//!
//! let greeting = hello.call().map(|value| format!("{value} world"));
//! assert_eq!(greeting.unwrap(), "Hello world");
//! ```

use std::fmt;
use std::sync::Arc;

use super::breaker::CircuitBreaker;
use super::types::CircuitBreakerError;

/// Decides whether an operation error counts as a failure
///
/// Errors that are not failures are still returned to the caller unchanged,
/// but the breaker records them as successful calls.
pub trait FailurePredicate<E: ?Sized> {
    fn is_failure(&self, error: &E) -> bool;
}

/// Counts every error as a failure
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAllErrors;

impl<E: ?Sized> FailurePredicate<E> for RecordAllErrors {
    fn is_failure(&self, _error: &E) -> bool {
        true
    }
}

impl<E: ?Sized, F> FailurePredicate<E> for F
where
    F: Fn(&E) -> bool,
{
    fn is_failure(&self, error: &E) -> bool {
        self(error)
    }
}

/// A zero-argument operation protected by a circuit breaker
#[derive(Clone)]
pub struct DecoratedSupplier<F, P = RecordAllErrors> {
    breaker: Arc<CircuitBreaker>,
    operation: F,
    predicate: P,
}

impl<F, P> fmt::Debug for DecoratedSupplier<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedSupplier")
            .field("breaker", &self.breaker.name())
            .finish_non_exhaustive()
    }
}

impl<F> DecoratedSupplier<F> {
    /// Only errors accepted by `predicate` count as failures
    pub fn with_failure_predicate<P>(self, predicate: P) -> DecoratedSupplier<F, P> {
        DecoratedSupplier {
            breaker: self.breaker,
            operation: self.operation,
            predicate,
        }
    }
}

impl<F, P> DecoratedSupplier<F, P> {
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Invoke the operation if the breaker permits it
    pub fn call<T, E>(&self) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn() -> Result<T, E>,
        E: fmt::Display,
        P: FailurePredicate<E>,
    {
        self.breaker.execute_with(&self.predicate, &self.operation)
    }

    /// Turn into a plain closure of the same shape
    pub fn into_fn<T, E>(self) -> impl Fn() -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn() -> Result<T, E>,
        E: fmt::Display,
        P: FailurePredicate<E>,
    {
        move || self.call::<T, E>()
    }
}

/// A one-argument transform protected by a circuit breaker
#[derive(Clone)]
pub struct DecoratedFunction<F, P = RecordAllErrors> {
    breaker: Arc<CircuitBreaker>,
    operation: F,
    predicate: P,
}

impl<F, P> fmt::Debug for DecoratedFunction<F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedFunction")
            .field("breaker", &self.breaker.name())
            .finish_non_exhaustive()
    }
}

impl<F> DecoratedFunction<F> {
    /// Only errors accepted by `predicate` count as failures
    pub fn with_failure_predicate<P>(self, predicate: P) -> DecoratedFunction<F, P> {
        DecoratedFunction {
            breaker: self.breaker,
            operation: self.operation,
            predicate,
        }
    }
}

impl<F, P> DecoratedFunction<F, P> {
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Apply the transform to `input` if the breaker permits it
    ///
    /// A rejected call drops `input` without invoking the transform.
    pub fn apply<A, T, E>(&self, input: A) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn(A) -> Result<T, E>,
        E: fmt::Display,
        P: FailurePredicate<E>,
    {
        self.breaker
            .execute_with(&self.predicate, || (self.operation)(input))
    }

    /// Turn into a plain closure of the same shape
    pub fn into_fn<A, T, E>(self) -> impl Fn(A) -> Result<T, CircuitBreakerError<E>>
    where
        F: Fn(A) -> Result<T, E>,
        E: fmt::Display,
        P: FailurePredicate<E>,
    {
        move |input| self.apply::<A, T, E>(input)
    }
}

/// Protect a zero-argument operation with `breaker`
pub fn decorate_supplier<F>(breaker: &Arc<CircuitBreaker>, operation: F) -> DecoratedSupplier<F> {
    DecoratedSupplier {
        breaker: Arc::clone(breaker),
        operation,
        predicate: RecordAllErrors,
    }
}

/// Protect a one-argument transform with `breaker`
pub fn decorate_function<F>(breaker: &Arc<CircuitBreaker>, operation: F) -> DecoratedFunction<F> {
    DecoratedFunction {
        breaker: Arc::clone(breaker),
        operation,
        predicate: RecordAllErrors,
    }
}

impl CircuitBreaker {
    /// Protect a zero-argument operation with this breaker
    pub fn decorate_supplier<F>(self: &Arc<Self>, operation: F) -> DecoratedSupplier<F> {
        decorate_supplier(self, operation)
    }

    /// Protect a one-argument transform with this breaker
    pub fn decorate_function<F>(self: &Arc<Self>, operation: F) -> DecoratedFunction<F> {
        decorate_function(self, operation)
    }
}

/// Combinators over the result of a protected call
pub trait CallResultExt<T, E> {
    /// Replace any failure, rejection included, with a fallback value
    fn recover<F>(self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce(CircuitBreakerError<E>) -> T;

    /// Replace only a rejection with a fallback value; operation errors pass through
    fn recover_rejected<F>(self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce(&str) -> T;

    /// Whether the call was rejected by an open breaker
    fn is_rejected(&self) -> bool;
}

impl<T, E> CallResultExt<T, E> for Result<T, CircuitBreakerError<E>> {
    fn recover<F>(self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce(CircuitBreakerError<E>) -> T,
    {
        Ok(self.unwrap_or_else(f))
    }

    fn recover_rejected<F>(self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce(&str) -> T,
    {
        match self {
            Err(CircuitBreakerError::Open { name }) => Ok(f(&name)),
            other => other,
        }
    }

    fn is_rejected(&self) -> bool {
        matches!(self, Err(CircuitBreakerError::Open { .. }))
    }
}
