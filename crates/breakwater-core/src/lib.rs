//! Breakwater Core Library
//!
//! A ring-buffer circuit breaker: wrap a fallible call, and once the recent
//! failure rate crosses a threshold further calls are rejected until a
//! cooldown has passed.

pub mod circuit_breaker;
pub mod error;

// Re-export commonly used types
pub use circuit_breaker::{
    CallResultExt, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
    CircuitBreakerRegistry, CircuitBreakerStats, CircuitState, RegistryConfig, decorate_function,
    decorate_supplier,
};
pub use error::{BreakwaterError, BreakwaterResult};
