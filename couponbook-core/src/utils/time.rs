use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;

/// Returns the current epoch milliseconds. Pre-1970 clocks read as 0.
pub fn current_epoch_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Wall-clock reading used by the cooldown clock. Redemptions take an
/// explicit `now_ms` instead, so only the periodic task needs this.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        current_epoch_millis()
    }
}

/// Hand-driven time, for tests and replaying sessions.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self { now: AtomicU64::new(start_ms) }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: u64) {
        self.now.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_source() {
        let t = ManualTimeSource::new(1000);
        t.advance(500);
        assert_eq!(t.now_millis(), 1500);
        t.set(20);
        assert_eq!(t.now_millis(), 20);
    }

    #[test]
    fn test_system_time_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemTimeSource.now_millis() > 1_577_836_800_000);
    }
}
