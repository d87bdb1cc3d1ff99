//! End-to-end usage scenarios for decorated calls
//!
//! These mirror how callers compose breakers: decorate, chain with `map` /
//! `and_then`, and recover from failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use breakwater::{
    CallResultExt, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
    CircuitBreakerRegistry, CircuitState, RegistryConfig, decorate_function, decorate_supplier,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("breakwater_core=debug")
        .try_init();
}

#[test]
fn test_decorated_supplier_chained_with_map() {
    init_tracing();
    let breaker = Arc::new(CircuitBreaker::of_defaults("testName"));

    let decorated = decorate_supplier(&breaker, || {
        Ok::<_, anyhow::Error>("This can be any method which returns: 'Hello".to_string())
    });
    let result = decorated.call().map(|value| value + " world'");

    assert_eq!(
        result.unwrap(),
        "This can be any method which returns: 'Hello world'"
    );
}

#[test]
fn test_supplier_and_function_on_different_breakers() {
    init_tracing();
    let breaker = Arc::new(CircuitBreaker::of_defaults("testName"));
    let another = Arc::new(CircuitBreaker::of_defaults("anotherTestName"));

    let supplier = decorate_supplier(&breaker, || Ok::<_, anyhow::Error>("Hello".to_string()));
    let function = decorate_function(&another, |input: String| {
        Ok::<_, anyhow::Error>(input + " world")
    });

    let result = supplier.call().and_then(|value| function.apply(value));

    assert_eq!(result.unwrap(), "Hello world");
    assert_eq!(breaker.stats().successful_calls, 1);
    assert_eq!(another.stats().successful_calls, 1);
}

#[test]
fn test_open_breaker_rejects_and_reset_closes() {
    init_tracing();
    let config = CircuitBreakerConfig::default()
        .with_ring_buffer_size_in_closed_state(2)
        .with_wait_duration_in_open_state(Duration::from_millis(1000));
    let breaker = Arc::new(CircuitBreaker::of("testName", config).unwrap());

    breaker.on_error(Duration::ZERO, &anyhow!("simulated failure"));
    // one failure fills only half of the ring buffer
    assert_eq!(breaker.state(), CircuitState::Closed);

    breaker.on_error(Duration::ZERO, &anyhow!("simulated failure"));
    assert_eq!(breaker.state(), CircuitState::Open);

    let invoked = AtomicBool::new(false);
    let decorated = decorate_supplier(&breaker, || {
        invoked.store(true, Ordering::SeqCst);
        Ok::<_, anyhow::Error>("Hello".to_string())
    });
    let result = decorated.call().map(|value| value + " world");

    match result {
        Err(CircuitBreakerError::Open { name }) => assert_eq!(name, "testName"),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(!invoked.load(Ordering::SeqCst));

    breaker.reset();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.stats().buffered_calls, 0);
}

#[test]
fn test_recover_from_failed_operation() {
    init_tracing();
    let breaker = Arc::new(CircuitBreaker::of_defaults("testName"));

    let decorated = decorate_supplier(&breaker, || -> anyhow::Result<String> {
        Err(anyhow!("BAM!"))
    });
    let failed = decorated.call();
    assert_eq!(
        failed.as_ref().unwrap_err().inner().map(|e| e.to_string()),
        Some("BAM!".to_string())
    );

    let result = decorated.call().recover(|_| "Hello Recovery".to_string());

    assert_eq!(result.unwrap(), "Hello Recovery");
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.stats().failed_calls, 2);
}

#[test]
fn test_simultaneous_failures_stay_isolated() {
    init_tracing();
    let registry = CircuitBreakerRegistry::from_config(
        RegistryConfig::from_toml_str(
            r#"
            [defaults]
            ring_buffer_size_in_closed_state = 2

            [instances.payments]
            ring_buffer_size_in_closed_state = 4
            "#,
        )
        .unwrap(),
    )
    .unwrap();
    let inventory = registry.circuit_breaker("inventory");
    let payments = registry.circuit_breaker("payments");

    let failing_inventory =
        decorate_supplier(&inventory, || Err::<(), _>(anyhow!("inventory down")));
    let failing_payments = decorate_supplier(&payments, || Err::<(), _>(anyhow!("payments down")));

    for _ in 0..2 {
        assert!(!failing_inventory.call().is_rejected());
        assert!(!failing_payments.call().is_rejected());
    }

    assert_eq!(inventory.state(), CircuitState::Open);
    assert_eq!(payments.state(), CircuitState::Closed);
    assert_eq!(payments.stats().buffered_calls, 2);
}

#[test]
fn test_open_breaker_probes_after_wait_duration() {
    init_tracing();
    let config = CircuitBreakerConfig::default()
        .with_ring_buffer_size_in_closed_state(2)
        .with_ring_buffer_size_in_half_open_state(1)
        .with_wait_duration_in_open_state(Duration::from_millis(30));
    let breaker = Arc::new(CircuitBreaker::of("probe", config).unwrap());
    breaker.trip();

    let healthy = decorate_supplier(&breaker, || Ok::<_, anyhow::Error>(1));
    assert!(healthy.call().is_rejected());

    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(healthy.call().unwrap(), 1);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.stats().not_permitted_calls, 1);
}

#[tokio::test]
async fn test_async_operation_through_breaker() {
    init_tracing();
    let breaker = CircuitBreaker::of_defaults("async");

    let result = breaker
        .execute_async(|| async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Ok::<_, anyhow::Error>("pong")
        })
        .await
        .recover_rejected(|_| "fallback");

    assert_eq!(result.unwrap(), "pong");
    assert_eq!(breaker.stats().successful_calls, 1);
}
