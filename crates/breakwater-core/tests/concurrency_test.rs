//! Concurrent use of a single circuit breaker

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use breakwater_core::circuit_breaker::{CircuitBreakerConfig, CircuitState};
use breakwater_core::{CircuitBreaker, CircuitBreakerRegistry, decorate_supplier};

const THREADS: usize = 8;
const CALLS_PER_THREAD: usize = 250;

#[test]
fn concurrent_outcomes_are_never_lost() {
    let capacity = THREADS * CALLS_PER_THREAD;
    let config = CircuitBreakerConfig::default()
        .with_ring_buffer_size_in_closed_state(capacity)
        .with_failure_rate_threshold(100);
    let breaker = Arc::new(CircuitBreaker::of("shared", config).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let breaker = Arc::clone(&breaker);
            thread::spawn(move || {
                for n in 0..CALLS_PER_THREAD {
                    if (i + n) % 2 == 0 {
                        breaker.on_success(Duration::from_micros(10));
                    } else {
                        breaker.on_error(Duration::from_micros(10), &"boom");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = breaker.stats();
    assert_eq!(stats.buffered_calls, capacity);
    assert_eq!(stats.failed_calls + stats.successful_calls, capacity);
    assert_eq!(stats.failure_rate, Some(50));
    assert_eq!(stats.state, CircuitState::Closed);
}

#[test]
fn concurrent_failures_open_the_breaker_exactly_once() {
    let config = CircuitBreakerConfig::default()
        .with_ring_buffer_size_in_closed_state(10)
        .with_wait_duration_in_open_state(Duration::from_secs(60));
    let breaker = Arc::new(CircuitBreaker::of("flaky", config).unwrap());
    let invocations = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let breaker = Arc::clone(&breaker);
            let invocations = Arc::clone(&invocations);
            thread::spawn(move || {
                let supplier = decorate_supplier(&breaker, || {
                    invocations.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("remote unavailable")
                });
                let mut rejected = 0;
                for _ in 0..CALLS_PER_THREAD {
                    if supplier.call().unwrap_err().is_open() {
                        rejected += 1;
                    }
                }
                rejected
            })
        })
        .collect();
    let rejected: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Open);
    let invoked = invocations.load(Ordering::SeqCst);
    assert_eq!(invoked + rejected, THREADS * CALLS_PER_THREAD);
    assert_eq!(stats.not_permitted_calls as usize, rejected);
    // calls already in flight when the breaker opened may still complete
    assert!(invoked >= 10);
    assert!(invoked < 10 + THREADS);
}

#[test]
fn registry_hands_out_one_breaker_per_name_across_threads() {
    let registry = Arc::new(CircuitBreakerRegistry::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.circuit_breaker("shared"))
        })
        .collect();
    let breakers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(breakers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
}
