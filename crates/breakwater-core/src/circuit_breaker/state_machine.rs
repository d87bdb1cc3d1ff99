//! Circuit breaker state machine
//!
//! # State Transitions
//! ```text
//! CLOSED    → OPEN:      closed ring buffer full and failure rate >= threshold
//! OPEN      → HALF_OPEN: first permission check after the wait duration
//! HALF_OPEN → CLOSED:    half-open ring buffer full and failure rate < threshold
//! HALF_OPEN → OPEN:      half-open ring buffer full and failure rate >= threshold
//! any       → CLOSED:    reset()
//! any       → OPEN:      trip()
//! ```
//!
//! The machine never reads the clock itself. Callers pass `now`, which keeps
//! every rule deterministic under test. It is not synchronized; the owning
//! [`CircuitBreaker`](super::CircuitBreaker) serializes access.

use std::time::{Duration, Instant};

use super::config::CircuitBreakerConfig;
use super::ring_buffer::OutcomeTracker;
use super::types::{CircuitState, StateTransition};

#[derive(Debug, Clone)]
enum Phase {
    Closed(OutcomeTracker),
    Open { opened_at: Instant },
    HalfOpen(OutcomeTracker),
}

impl Phase {
    fn state(&self) -> CircuitState {
        match self {
            Self::Closed(_) => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen(_) => CircuitState::HalfOpen,
        }
    }
}

/// Result of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit {
    pub permitted: bool,
    /// Set when the check itself moved OPEN to HALF_OPEN
    pub transition: Option<StateTransition>,
}

/// Transition rules over an [`OutcomeTracker`]
#[derive(Debug, Clone)]
pub struct StateMachine {
    config: CircuitBreakerConfig,
    phase: Phase,
    last_transition: Option<Instant>,
}

impl StateMachine {
    /// Create a machine in the CLOSED state
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let phase = Phase::Closed(OutcomeTracker::new(config.ring_buffer_size_in_closed_state));
        Self {
            config,
            phase,
            last_transition: None,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.phase.state()
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// When the last automatic or forced transition happened
    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }

    /// The active tracker; OPEN has none
    pub fn tracker(&self) -> Option<&OutcomeTracker> {
        match &self.phase {
            Phase::Closed(tracker) | Phase::HalfOpen(tracker) => Some(tracker),
            Phase::Open { .. } => None,
        }
    }

    /// Decide whether a call may proceed
    pub fn try_acquire(&mut self, now: Instant) -> Permit {
        match self.phase {
            Phase::Closed(_) | Phase::HalfOpen(_) => Permit {
                permitted: true,
                transition: None,
            },
            Phase::Open { opened_at } => {
                let elapsed = now.saturating_duration_since(opened_at);
                if elapsed >= self.config.wait_duration_in_open_state {
                    let transition = self.transition_to_half_open(now);
                    Permit {
                        permitted: true,
                        transition: Some(transition),
                    }
                } else {
                    Permit {
                        permitted: false,
                        transition: None,
                    }
                }
            }
        }
    }

    /// Record a successful call. Ignored while OPEN.
    pub fn on_success(&mut self, duration: Duration, now: Instant) -> Option<StateTransition> {
        match &mut self.phase {
            Phase::Closed(tracker) | Phase::HalfOpen(tracker) => {
                tracker.record_success(duration, now)
            }
            Phase::Open { .. } => return None,
        }
        self.evaluate(now)
    }

    /// Record a failed call. Ignored while OPEN.
    pub fn on_error(&mut self, duration: Duration, now: Instant) -> Option<StateTransition> {
        match &mut self.phase {
            Phase::Closed(tracker) | Phase::HalfOpen(tracker) => {
                tracker.record_failure(duration, now)
            }
            Phase::Open { .. } => return None,
        }
        self.evaluate(now)
    }

    /// Force CLOSED with an empty tracker and no transition timestamp
    pub fn reset(&mut self) -> StateTransition {
        let from = self.state();
        self.phase = Phase::Closed(OutcomeTracker::new(
            self.config.ring_buffer_size_in_closed_state,
        ));
        self.last_transition = None;
        StateTransition {
            from,
            to: CircuitState::Closed,
        }
    }

    /// Force OPEN, restarting the wait timer
    pub fn trip(&mut self, now: Instant) -> StateTransition {
        self.transition_to_open(now)
    }

    fn evaluate(&mut self, now: Instant) -> Option<StateTransition> {
        let threshold = self.config.failure_rate_threshold;
        match &self.phase {
            Phase::Closed(tracker) => {
                let rate = tracker.failure_rate()?;
                (rate >= threshold).then(|| self.transition_to_open(now))
            }
            Phase::HalfOpen(tracker) => {
                let rate = tracker.failure_rate()?;
                if rate >= threshold {
                    Some(self.transition_to_open(now))
                } else {
                    Some(self.transition_to_closed(now))
                }
            }
            Phase::Open { .. } => None,
        }
    }

    fn transition_to_open(&mut self, now: Instant) -> StateTransition {
        self.transition(Phase::Open { opened_at: now }, now)
    }

    fn transition_to_half_open(&mut self, now: Instant) -> StateTransition {
        let tracker = OutcomeTracker::new(self.config.ring_buffer_size_in_half_open_state);
        self.transition(Phase::HalfOpen(tracker), now)
    }

    fn transition_to_closed(&mut self, now: Instant) -> StateTransition {
        let tracker = OutcomeTracker::new(self.config.ring_buffer_size_in_closed_state);
        self.transition(Phase::Closed(tracker), now)
    }

    fn transition(&mut self, phase: Phase, now: Instant) -> StateTransition {
        let from = self.state();
        self.phase = phase;
        self.last_transition = Some(now);
        StateTransition {
            from,
            to: self.state(),
        }
    }
}
