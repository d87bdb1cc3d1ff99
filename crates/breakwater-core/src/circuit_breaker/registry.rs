//! Circuit breaker registry for managing multiple circuit breakers

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::breaker::CircuitBreaker;
use super::config::{CircuitBreakerConfig, RegistryConfig};
use super::types::CircuitBreakerStats;
use crate::error::{BreakwaterError, BreakwaterResult};

/// Owned collection of named circuit breakers
///
/// Each name maps to exactly one breaker; breakers never share state.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: RegistryConfig,
}

impl CircuitBreakerRegistry {
    /// Create a new registry with default config
    pub fn new() -> Self {
        Self {
            breakers: DashMap::new(),
            config: RegistryConfig::default(),
        }
    }

    /// Create a registry with custom default config
    pub fn with_config(default_config: CircuitBreakerConfig) -> BreakwaterResult<Self> {
        Self::from_config(RegistryConfig {
            defaults: default_config,
            ..Default::default()
        })
    }

    /// Create a registry with defaults and per-instance settings
    pub fn from_config(config: RegistryConfig) -> BreakwaterResult<Self> {
        config.validate()?;
        Ok(Self {
            breakers: DashMap::new(),
            config,
        })
    }

    /// Get or create the circuit breaker called `name`
    ///
    /// New breakers use the instance settings for `name` if the registry
    /// config has any, otherwise the registry defaults.
    pub fn circuit_breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(self.create(name)))
            .clone()
    }

    /// Get or create a circuit breaker with an explicit config
    ///
    /// Fails if the config is invalid, or if `name` is already registered
    /// with a different config.
    pub fn circuit_breaker_with_config(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
    ) -> BreakwaterResult<Arc<CircuitBreaker>> {
        config.validate()?;
        match self.breakers.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if existing.config() != &config {
                    return Err(BreakwaterError::config(format!(
                        "circuit breaker '{}' is already registered with a different config",
                        name
                    )));
                }
                Ok(Arc::clone(existing))
            }
            Entry::Vacant(entry) => {
                let breaker = Arc::new(CircuitBreaker::of(name, config)?);
                Ok(Arc::clone(entry.insert(breaker).value()))
            }
        }
    }

    /// Look up a registered circuit breaker
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|e| Arc::clone(e.value()))
    }

    /// Remove a circuit breaker; existing handles keep working
    pub fn remove(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.remove(name).map(|(_, breaker)| breaker)
    }

    /// Get all circuit breaker names
    pub fn names(&self) -> Vec<String> {
        self.breakers.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Get stats for all circuit breakers
    pub fn all_stats(&self) -> Vec<(String, CircuitBreakerStats)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }

    /// Reset all circuit breakers
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }

    fn create(&self, name: &str) -> CircuitBreaker {
        // validated in from_config
        CircuitBreaker::of(name, self.config.config_for(name))
            .unwrap_or_else(|_| CircuitBreaker::of_defaults(name))
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
