use std::time::Duration;

const DEFAULT_FLOOR: Duration = Duration::from_secs(4 * 60);
const DEFAULT_CEILING: Duration = Duration::from_secs(14 * 60);
const GROWTH_NUM: u32 = 3;
const GROWTH_DEN: u32 = 2;

/// Delay policy for the worker's reconciliation loop, driven by
/// control-plane RPC health.
///
/// Transport failures stretch the delay toward the ceiling (×1.5 per
/// failure); any successful tick snaps it back to the floor. Non-transport
/// errors leave the state alone.
#[derive(Debug, Clone)]
pub struct RpcBackoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl RpcBackoff {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling,
            current: floor,
        }
    }

    pub fn delay(&self) -> Duration {
        self.current
    }

    pub fn record_failure(&mut self) {
        let grown = self.current * GROWTH_NUM / GROWTH_DEN;
        self.current = grown.min(self.ceiling);
    }

    pub fn record_success(&mut self) {
        self.current = self.floor;
    }
}

impl Default for RpcBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR, DEFAULT_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_strictly_increase_until_ceiling() {
        let mut backoff = RpcBackoff::default();
        let floor = backoff.delay();

        backoff.record_failure();
        let first = backoff.delay();
        backoff.record_failure();
        let second = backoff.delay();
        backoff.record_failure();
        let third = backoff.delay();

        assert!(first > floor);
        assert!(second > first);
        assert!(third > second);
        assert!(third <= DEFAULT_CEILING);
    }

    #[test]
    fn delay_is_capped_at_the_ceiling() {
        let mut backoff = RpcBackoff::default();
        for _ in 0..20 {
            backoff.record_failure();
        }
        assert_eq!(backoff.delay(), DEFAULT_CEILING);
    }

    #[test]
    fn success_resets_to_the_floor() {
        let mut backoff = RpcBackoff::default();
        backoff.record_failure();
        backoff.record_failure();
        assert!(backoff.delay() > DEFAULT_FLOOR);

        backoff.record_success();
        assert_eq!(backoff.delay(), DEFAULT_FLOOR);
    }
}
