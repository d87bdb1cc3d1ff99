//! Circuit breaker pattern for fault tolerance
//!
//! Prevents cascading failures by tracking recent call outcomes in a ring
//! buffer and rejecting calls while the failure rate is too high.
//!
//! # Data Flow
//! ```text
//! caller → decorator → CircuitBreaker::is_call_permitted
//!        → (permitted) operation → on_success / on_error
//!        → OutcomeTracker → StateMachine may transition
//! ```

mod breaker;
mod config;
mod decorators;
mod registry;
mod ring_buffer;
mod state_machine;
mod types;


// Re-export all public items
pub use breaker::CircuitBreaker;
pub use config::{
    CircuitBreakerConfig, CircuitBreakerOverrides, DEFAULT_FAILURE_RATE_THRESHOLD,
    DEFAULT_RING_BUFFER_SIZE_IN_CLOSED_STATE, DEFAULT_RING_BUFFER_SIZE_IN_HALF_OPEN_STATE,
    DEFAULT_WAIT_DURATION_IN_OPEN_STATE, RegistryConfig,
};
pub use decorators::{
    CallResultExt, DecoratedFunction, DecoratedSupplier, FailurePredicate, RecordAllErrors,
    decorate_function, decorate_supplier,
};
pub use registry::CircuitBreakerRegistry;
pub use ring_buffer::{OutcomeRecord, OutcomeTracker};
pub use state_machine::{Permit, StateMachine};
pub use types::{CircuitBreakerError, CircuitBreakerStats, CircuitState, StateTransition};
