//! Breakwater: a ring-buffer circuit breaker
//!
//! ```
//! use std::sync::Arc;
//! use breakwater::{CircuitBreaker, CallResultExt, decorate_supplier};
//!
//! let breaker = Arc::new(CircuitBreaker::of_defaults("inventory"));
//! let lookup = decorate_supplier(&breaker, || Err::<&str, _>("connection refused"));
//!
//! let value = lookup.call().recover(|_| "cached").unwrap();
//! assert_eq!(value, "cached");
//! ```

pub use breakwater_core::circuit_breaker;
pub use breakwater_core::error;
pub use breakwater_core::{
    BreakwaterError, BreakwaterResult, CallResultExt, CircuitBreaker, CircuitBreakerConfig,
    CircuitBreakerError, CircuitBreakerRegistry, CircuitBreakerStats, CircuitState,
    RegistryConfig, decorate_function, decorate_supplier,
};
