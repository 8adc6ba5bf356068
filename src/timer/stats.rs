use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of the current (or last) run, reset on every start.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerStats {
    /// Ticks whose schedule was advanced, delivered or not.
    pub scheduled: u64,
    pub delivered: u64,
    /// Ticks dropped by the late threshold.
    pub suppressed: u64,
    /// Handler errors and panics caught on the tick thread.
    pub handler_faults: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    scheduled: AtomicU64,
    delivered: AtomicU64,
    suppressed: AtomicU64,
    handler_faults: AtomicU64,
}

impl Counters {
    pub(crate) fn reset(&self) {
        for counter in [
            &self.scheduled,
            &self.delivered,
            &self.suppressed,
            &self.handler_faults,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn set_scheduled(&self, ticks: u64) {
        self.scheduled.store(ticks, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self, faults: u64) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        if faults > 0 {
            self.handler_faults.fetch_add(faults, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> TimerStats {
        TimerStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            handler_faults: self.handler_faults.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot_and_reset() {
        let counters = Counters::default();
        counters.set_scheduled(4);
        counters.record_delivery(0);
        counters.record_delivery(2);
        counters.record_suppressed();

        assert_eq!(
            counters.snapshot(),
            TimerStats {
                scheduled: 4,
                delivered: 2,
                suppressed: 1,
                handler_faults: 2,
            }
        );

        counters.reset();
        assert_eq!(counters.snapshot(), TimerStats::default());
    }
}
