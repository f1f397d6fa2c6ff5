//! Saturating Streak Counter

/// Counts consecutive events up to a fixed limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedCounter {
    count: u32,
    limit: u32,
}

impl BoundedCounter {
    /// Create a counter that saturates at `limit` (minimum 1)
    pub fn new(limit: u32) -> Self {
        Self {
            count: 0,
            limit: limit.max(1),
        }
    }

    /// Count one event; returns true once the limit is reached
    pub fn increment(&mut self) -> bool {
        self.count = (self.count + 1).min(self.limit);
        self.is_reached()
    }

    /// Whether the limit has been reached
    pub fn is_reached(&self) -> bool {
        self.count >= self.limit
    }

    /// Current count
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Limit
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Back to zero
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_saturates() {
        let mut counter = BoundedCounter::new(2);
        assert!(!counter.increment());
        assert!(counter.increment());
        assert!(counter.increment());
        assert_eq!(counter.count(), 2);
        counter.reset();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_zero_limit_is_one() {
        let mut counter = BoundedCounter::new(0);
        assert_eq!(counter.limit(), 1);
        assert!(counter.increment());
    }
}
