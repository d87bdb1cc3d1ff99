//! Fixed-capacity record of recent call outcomes

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A single recorded call outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub success: bool,
    pub duration: Duration,
    pub recorded_at: Instant,
}

/// Circular buffer of the most recent outcomes
///
/// Once `capacity` records exist each new record evicts the oldest one. The
/// failure count is maintained incrementally so [`failure_rate`] is O(1).
///
/// [`failure_rate`]: OutcomeTracker::failure_rate
#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    records: VecDeque<OutcomeRecord>,
    capacity: usize,
    failures: usize,
}

impl OutcomeTracker {
    /// Create an empty tracker. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Record a successful call
    pub fn record_success(&mut self, duration: Duration, now: Instant) {
        self.push(OutcomeRecord {
            success: true,
            duration,
            recorded_at: now,
        });
    }

    /// Record a failed call
    pub fn record_failure(&mut self, duration: Duration, now: Instant) {
        self.push(OutcomeRecord {
            success: false,
            duration,
            recorded_at: now,
        });
    }

    fn push(&mut self, record: OutcomeRecord) {
        if self.records.len() == self.capacity {
            if let Some(evicted) = self.records.pop_front() {
                if !evicted.success {
                    self.failures -= 1;
                }
            }
        }
        if !record.success {
            self.failures += 1;
        }
        self.records.push_back(record);
    }

    /// Failure rate in whole percent, truncated toward zero
    ///
    /// Returns `None` until the buffer holds `capacity` outcomes.
    pub fn failure_rate(&self) -> Option<u8> {
        if !self.is_full() {
            return None;
        }
        // failures <= len, so the quotient is at most 100
        Some((self.failures * 100 / self.records.len()) as u8)
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn failed_calls(&self) -> usize {
        self.failures
    }

    pub fn successful_calls(&self) -> usize {
        self.records.len() - self.failures
    }

    /// Outcomes from oldest to newest
    pub fn records(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.records.iter()
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_not_enough_data_until_full() {
        let now = Instant::now();
        let mut tracker = OutcomeTracker::new(3);
        assert_eq!(tracker.failure_rate(), None);

        tracker.record_failure(ms(1), now);
        tracker.record_failure(ms(1), now);
        assert_eq!(tracker.failure_rate(), None);
        assert!(!tracker.is_full());

        tracker.record_success(ms(1), now);
        assert!(tracker.is_full());
        assert_eq!(tracker.failure_rate(), Some(66));
    }

    #[test]
    fn test_half_of_two_is_fifty() {
        let now = Instant::now();
        let mut tracker = OutcomeTracker::new(2);
        tracker.record_success(ms(1), now);
        tracker.record_failure(ms(1), now);
        assert_eq!(tracker.failure_rate(), Some(50));
    }

    #[test]
    fn test_oldest_outcome_is_evicted() {
        let now = Instant::now();
        let mut tracker = OutcomeTracker::new(2);
        tracker.record_failure(ms(1), now);
        tracker.record_failure(ms(2), now);
        assert_eq!(tracker.failure_rate(), Some(100));

        tracker.record_success(ms(3), now);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.failed_calls(), 1);
        assert_eq!(tracker.failure_rate(), Some(50));

        tracker.record_success(ms(4), now);
        assert_eq!(tracker.failure_rate(), Some(0));
        let durations: Vec<_> = tracker.records().map(|r| r.duration).collect();
        assert_eq!(durations, vec![ms(3), ms(4)]);
    }

    #[test]
    fn test_clear_resets_counts() {
        let now = Instant::now();
        let mut tracker = OutcomeTracker::new(2);
        tracker.record_failure(ms(1), now);
        tracker.record_success(ms(1), now);
        tracker.clear();

        assert!(tracker.is_empty());
        assert_eq!(tracker.failed_calls(), 0);
        assert_eq!(tracker.successful_calls(), 0);
        assert_eq!(tracker.failure_rate(), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let tracker = OutcomeTracker::new(0);
        assert_eq!(tracker.capacity(), 1);
    }
}
