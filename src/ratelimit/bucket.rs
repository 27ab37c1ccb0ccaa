//! Single-caller token bucket.

use std::time::Instant;

/// Token bucket holding a replenishing quota of whole tokens.
///
/// Refill is truncating: each refill adds `floor(elapsed_secs * refill_rate)`
/// tokens and, only when that is positive, moves `last_refill` to the
/// refill instant. Fractional progress at the moment of a refill is
/// discarded rather than carried forward, so the delivered rate can fall
/// slightly below the nominal one.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u64,
    tokens: u64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(capacity: u64, refill_rate: f64) -> Self {
        Self::new_at(capacity, refill_rate, Instant::now())
    }

    /// Create a full bucket whose refill clock starts at `now`.
    pub fn new_at(capacity: u64, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_rate,
            last_refill: now,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Take `cost` tokens if available. A rejected attempt leaves the
    /// token count untouched.
    pub fn try_acquire(&mut self, cost: u64) -> bool {
        self.try_acquire_at(cost, Instant::now())
    }

    /// [`try_acquire`](Self::try_acquire) against an explicit clock reading.
    pub fn try_acquire_at(&mut self, cost: u64, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Refill, then report the tokens currently available.
    pub fn available(&mut self) -> u64 {
        self.available_at(Instant::now())
    }

    /// [`available`](Self::available) against an explicit clock reading.
    pub fn available_at(&mut self, now: Instant) -> u64 {
        self.refill(now);
        self.tokens
    }

    fn refill(&mut self, now: Instant) {
        // saturating: a clock reading older than last_refill counts as zero
        let elapsed = now
            .saturating_duration_since(self.last_refill)
            .as_secs_f64();
        let to_add = (elapsed * self.refill_rate).floor();
        if to_add >= 1.0 {
            // float → int casts saturate, so an enormous idle gap just fills the bucket
            let to_add = to_add as u64;
            self.tokens = self.tokens.saturating_add(to_add).min(self.capacity);
            self.last_refill = now;
        }
    }
}
