//! Time source shared by issuance and verification

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unix seconds provider.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall clock. Issuer and verifier hosts are expected to be NTP-synchronised.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // A clock before 1970 reads as 0, which makes every token expired.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self { FixedClock(AtomicU64::new(now)) }
    pub fn set(&self, now: u64) { self.0.store(now, Ordering::SeqCst) }
    pub fn advance(&self, secs: u64) { self.0.fetch_add(secs, Ordering::SeqCst); }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 { self.0.load(Ordering::SeqCst) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let c = FixedClock::new(100);
        assert_eq!(c.now(), 100);
        c.advance(1800);
        assert_eq!(c.now(), 1900);
        c.set(5);
        assert_eq!(c.now(), 5);
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
