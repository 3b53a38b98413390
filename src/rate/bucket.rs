//! Token-bucket enforcement of a [`RateLimit`](super::RateLimit).

use std::time::Instant;

use tokio::time::{sleep, Duration};

use crate::rate::RateLimit;

/// A token bucket over one byte-transfer direction.
///
/// Tokens are bytes. The bucket refills continuously at the sustained rate
/// up to the burst capacity. An unlimited limiter admits everything.
pub struct RateLimiter {
    bucket: Option<Bucket>,
}

struct Bucket {
    capacity: f64,
    refill_rate: f64,
    tokens: f64,
    last_update: Instant,
}

impl Bucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_update = now;
    }
}

impl RateLimiter {
    /// Build a limiter enforcing the given descriptor.
    pub fn new(limit: RateLimit) -> Self {
        let bucket = match limit {
            RateLimit::Unlimited => None,
            RateLimit::Limited { bytes_per_sec, burst } => Some(Bucket {
                capacity: burst as f64,
                refill_rate: bytes_per_sec as f64,
                // starts full so the first burst is admitted immediately
                tokens: burst as f64,
                last_update: Instant::now(),
            }),
        };
        Self { bucket }
    }

    /// A limiter that admits everything.
    pub fn unlimited() -> Self {
        Self::new(RateLimit::Unlimited)
    }

    pub fn is_unlimited(&self) -> bool {
        self.bucket.is_none()
    }

    /// Try to consume `n` bytes worth of tokens without blocking.
    pub fn try_acquire(&mut self, n: u64) -> bool {
        let Some(bucket) = self.bucket.as_mut() else {
            return true;
        };
        bucket.refill();
        let wanted = n as f64;
        if bucket.tokens >= wanted {
            bucket.tokens -= wanted;
            true
        } else {
            false
        }
    }

    /// Consume `n` bytes worth of tokens, sleeping until enough have
    /// accumulated. Acquisitions larger than the burst capacity are clamped
    /// to it, so they complete after one full refill.
    pub async fn wait(&mut self, n: u64) {
        loop {
            let deficit = {
                let Some(bucket) = self.bucket.as_mut() else {
                    return;
                };
                bucket.refill();
                let wanted = (n as f64).min(bucket.capacity);
                if bucket.tokens >= wanted {
                    bucket.tokens -= wanted;
                    return;
                }
                (wanted - bucket.tokens) / bucket.refill_rate
            };
            sleep(Duration::from_secs_f64(deficit)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_admits_everything() {
        let mut limiter = RateLimiter::unlimited();
        assert!(limiter.is_unlimited());
        assert!(limiter.try_acquire(u64::MAX));
    }

    #[test]
    fn test_burst_admitted_then_throttled() {
        let mut limiter = RateLimit::Limited { bytes_per_sec: 1_000, burst: 3_000 }.into_limiter();
        assert!(limiter.try_acquire(3_000));
        // bucket drained; a full burst cannot be admitted again immediately
        assert!(!limiter.try_acquire(3_000));
    }

    #[test]
    fn test_partial_acquisitions_drain_the_bucket() {
        let mut limiter = RateLimit::Limited { bytes_per_sec: 1_000, burst: 3_000 }.into_limiter();
        assert!(limiter.try_acquire(1_000));
        assert!(limiter.try_acquire(1_000));
        assert!(!limiter.try_acquire(2_500));
    }

    #[tokio::test]
    async fn test_wait_completes_after_refill() {
        let mut limiter =
            RateLimit::Limited { bytes_per_sec: 1_000_000, burst: 3_000_000 }.into_limiter();
        limiter.wait(3_000_000).await;
        // drained; the next small acquisition refills within ~1ms
        limiter.wait(1_000).await;
    }
}
