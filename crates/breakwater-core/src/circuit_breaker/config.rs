//! Circuit breaker configuration
//!
//! A [`CircuitBreakerConfig`] is immutable once handed to a breaker. Registries
//! can be configured from TOML:
//!
//! ```toml
//! [defaults]
//! failure_rate_threshold = 50
//! wait_duration_in_open_state = "30s"
//!
//! [instances.inventory]
//! ring_buffer_size_in_closed_state = 20
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{BreakwaterError, BreakwaterResult};

/// Default failure rate threshold, in percent
pub const DEFAULT_FAILURE_RATE_THRESHOLD: u8 = 50;
/// Default number of outcomes tracked while closed
pub const DEFAULT_RING_BUFFER_SIZE_IN_CLOSED_STATE: usize = 100;
/// Default number of outcomes tracked while half-open
pub const DEFAULT_RING_BUFFER_SIZE_IN_HALF_OPEN_STATE: usize = 10;
/// Default cooldown before an open breaker lets a probe through
pub const DEFAULT_WAIT_DURATION_IN_OPEN_STATE: Duration = Duration::from_secs(60);

/// Configuration for circuit breaker behavior
///
/// # Example
/// ```
/// use breakwater_core::circuit_breaker::CircuitBreakerConfig;
/// use std::time::Duration;
///
/// let config = CircuitBreakerConfig::default()
///     .with_ring_buffer_size_in_closed_state(2)
///     .with_wait_duration_in_open_state(Duration::from_millis(1000));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Failure rate (percent) at or above which the breaker opens
    pub failure_rate_threshold: u8,
    /// Number of most recent outcomes evaluated while closed
    pub ring_buffer_size_in_closed_state: usize,
    /// Number of probe outcomes evaluated while half-open
    pub ring_buffer_size_in_half_open_state: usize,
    /// Time the breaker stays open before allowing probes
    #[serde(with = "humantime_serde")]
    pub wait_duration_in_open_state: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            ring_buffer_size_in_closed_state: DEFAULT_RING_BUFFER_SIZE_IN_CLOSED_STATE,
            ring_buffer_size_in_half_open_state: DEFAULT_RING_BUFFER_SIZE_IN_HALF_OPEN_STATE,
            wait_duration_in_open_state: DEFAULT_WAIT_DURATION_IN_OPEN_STATE,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that trips quickly on a small sample
    pub fn aggressive() -> Self {
        Self {
            failure_rate_threshold: 25,
            ring_buffer_size_in_closed_state: 10,
            ring_buffer_size_in_half_open_state: 3,
            wait_duration_in_open_state: Duration::from_secs(15),
        }
    }

    /// Create a config that tolerates bursts of failures
    pub fn lenient() -> Self {
        Self {
            failure_rate_threshold: 75,
            ring_buffer_size_in_closed_state: 200,
            ring_buffer_size_in_half_open_state: 20,
            wait_duration_in_open_state: Duration::from_secs(120),
        }
    }

    /// Set the failure rate threshold (percent)
    pub fn with_failure_rate_threshold(mut self, threshold: u8) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    /// Set the closed-state ring buffer size
    pub fn with_ring_buffer_size_in_closed_state(mut self, size: usize) -> Self {
        self.ring_buffer_size_in_closed_state = size;
        self
    }

    /// Set the half-open-state ring buffer size
    pub fn with_ring_buffer_size_in_half_open_state(mut self, size: usize) -> Self {
        self.ring_buffer_size_in_half_open_state = size;
        self
    }

    /// Set how long the breaker stays open
    pub fn with_wait_duration_in_open_state(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open_state = duration;
        self
    }

    /// Check that thresholds and buffer sizes are within range
    pub fn validate(&self) -> BreakwaterResult<()> {
        if self.failure_rate_threshold > 100 {
            return Err(BreakwaterError::config_field(
                "failure_rate_threshold",
                format!(
                    "failure rate threshold must be between 0 and 100, got {}",
                    self.failure_rate_threshold
                ),
            ));
        }
        if self.ring_buffer_size_in_closed_state == 0 {
            return Err(BreakwaterError::config_field(
                "ring_buffer_size_in_closed_state",
                "ring buffer size in closed state must be greater than 0",
            ));
        }
        if self.ring_buffer_size_in_half_open_state == 0 {
            return Err(BreakwaterError::config_field(
                "ring_buffer_size_in_half_open_state",
                "ring buffer size in half-open state must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Per-instance overrides applied on top of the registry defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitBreakerOverrides {
    pub failure_rate_threshold: Option<u8>,
    pub ring_buffer_size_in_closed_state: Option<usize>,
    pub ring_buffer_size_in_half_open_state: Option<usize>,
    #[serde(with = "humantime_serde")]
    pub wait_duration_in_open_state: Option<Duration>,
}

impl CircuitBreakerOverrides {
    /// Overlay these overrides onto `base`
    pub fn apply(&self, base: &CircuitBreakerConfig) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_rate_threshold: self
                .failure_rate_threshold
                .unwrap_or(base.failure_rate_threshold),
            ring_buffer_size_in_closed_state: self
                .ring_buffer_size_in_closed_state
                .unwrap_or(base.ring_buffer_size_in_closed_state),
            ring_buffer_size_in_half_open_state: self
                .ring_buffer_size_in_half_open_state
                .unwrap_or(base.ring_buffer_size_in_half_open_state),
            wait_duration_in_open_state: self
                .wait_duration_in_open_state
                .unwrap_or(base.wait_duration_in_open_state),
        }
    }
}

/// Configuration for a [`CircuitBreakerRegistry`](super::CircuitBreakerRegistry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Config used for breakers without an instance entry
    pub defaults: CircuitBreakerConfig,
    /// Named breakers with their own settings
    pub instances: HashMap<String, CircuitBreakerOverrides>,
}

impl RegistryConfig {
    /// Parse and validate a registry configuration from TOML text
    pub fn from_toml_str(text: &str) -> BreakwaterResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a registry configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> BreakwaterResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BreakwaterError::parse(format!("failed to read {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "Loading circuit breaker registry config");
        Self::from_toml_str(&text)
    }

    /// Resolved configuration for the breaker called `name`
    pub fn config_for(&self, name: &str) -> CircuitBreakerConfig {
        match self.instances.get(name) {
            Some(overrides) => overrides.apply(&self.defaults),
            None => self.defaults.clone(),
        }
    }

    /// Validate the defaults and every resolved instance
    pub fn validate(&self) -> BreakwaterResult<()> {
        self.defaults.validate()?;
        for name in self.instances.keys() {
            self.config_for(name).validate().map_err(|e| match e {
                BreakwaterError::Config { message, field } => BreakwaterError::Config {
                    message: format!("instance '{}': {}", name, message),
                    field,
                },
                other => other,
            })?;
        }
        Ok(())
    }
}
