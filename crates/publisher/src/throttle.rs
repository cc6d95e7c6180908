//! Broker publish throttle.

use contracts::TimestampMs;

/// Rate limit for the broker sink
///
/// The first request always passes; after that at least `interval_ms` must
/// elapse between accepted publishes.
#[derive(Debug, Clone)]
pub struct BrokerThrottle {
    interval_ms: u64,
    last_publish_at_ms: Option<TimestampMs>,
}

impl BrokerThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_publish_at_ms: None,
        }
    }

    /// Whether a publish at `now_ms` is allowed
    pub fn ready(&self, now_ms: TimestampMs) -> bool {
        match self.last_publish_at_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Record an accepted publish
    pub fn mark(&mut self, now_ms: TimestampMs) {
        self.last_publish_at_ms = Some(now_ms);
    }

    pub fn last_publish_at_ms(&self) -> Option<TimestampMs> {
        self.last_publish_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_throttle() {
        let mut throttle = BrokerThrottle::new(1_000);
        let mut delivered = Vec::new();

        for now in [0, 400, 1_100] {
            if throttle.ready(now) {
                throttle.mark(now);
                delivered.push(now);
            }
        }

        assert_eq!(delivered, vec![0, 1_100]);
    }

    #[test]
    fn test_interval_boundary_passes() {
        let mut throttle = BrokerThrottle::new(1_000);
        throttle.mark(5_000);
        assert!(!throttle.ready(5_999));
        assert!(throttle.ready(6_000));
    }

    #[test]
    fn test_unmarked_stays_ready() {
        let throttle = BrokerThrottle::new(1_000);
        assert!(throttle.ready(0));
        assert!(throttle.ready(10));
        assert_eq!(throttle.last_publish_at_ms(), None);
    }
}
