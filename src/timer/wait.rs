use std::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use crate::timer::Stopwatch;

const TIGHT_SPIN_BELOW_MICROS: i64 = 1_000;
const LONG_SPIN_BELOW_MICROS: i64 = 5_000;
const SHORT_SLEEP_BELOW_MICROS: i64 = 15_000;

/// How the tick thread waits for the next trigger.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Escalates from tight spinning to sleeping as the remaining time grows.
    #[default]
    Balanced,
    /// Busy-spins for the whole wait. Most precise, keeps one core busy.
    Spin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitStep {
    Spin(u32),
    Sleep(Duration),
}

impl WaitPolicy {
    pub(crate) fn step_for(self, remaining_micros: i64) -> WaitStep {
        match self {
            WaitPolicy::Spin => WaitStep::Spin(10),
            WaitPolicy::Balanced => match remaining_micros {
                r if r < TIGHT_SPIN_BELOW_MICROS => WaitStep::Spin(10),
                r if r < LONG_SPIN_BELOW_MICROS => WaitStep::Spin(100),
                r if r < SHORT_SLEEP_BELOW_MICROS => WaitStep::Sleep(Duration::from_millis(1)),
                _ => WaitStep::Sleep(Duration::from_millis(10)),
            },
        }
    }

    /// Waits until `stopwatch` reaches `target_micros`.
    ///
    /// Returns the reading that met the target, or `None` once `stop` is set.
    pub(crate) fn wait_until(
        self,
        stopwatch: &Stopwatch,
        target_micros: i64,
        stop: &AtomicBool,
    ) -> Option<i64> {
        loop {
            if stop.load(Ordering::Acquire) {
                return None;
            }

            let elapsed = stopwatch.elapsed_micros();
            let remaining = target_micros.saturating_sub(elapsed);
            if remaining <= 0 {
                return Some(elapsed);
            }

            match self.step_for(remaining) {
                WaitStep::Spin(rounds) => {
                    for _ in 0..rounds {
                        hint::spin_loop();
                    }
                }
                WaitStep::Sleep(duration) => thread::sleep(duration),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_escalates_with_remaining_time() {
        let policy = WaitPolicy::Balanced;
        assert_eq!(policy.step_for(10), WaitStep::Spin(10));
        assert_eq!(policy.step_for(999), WaitStep::Spin(10));
        assert_eq!(policy.step_for(1_000), WaitStep::Spin(100));
        assert_eq!(policy.step_for(4_999), WaitStep::Spin(100));
        assert_eq!(
            policy.step_for(5_000),
            WaitStep::Sleep(Duration::from_millis(1))
        );
        assert_eq!(
            policy.step_for(15_000),
            WaitStep::Sleep(Duration::from_millis(10))
        );
    }

    #[test]
    fn test_spin_never_sleeps() {
        assert_eq!(WaitPolicy::Spin.step_for(1_000_000), WaitStep::Spin(10));
    }

    #[test]
    fn test_wait_until_reaches_target() {
        let stopwatch = Stopwatch::new().unwrap();
        let stop = AtomicBool::new(false);
        for policy in [WaitPolicy::Balanced, WaitPolicy::Spin] {
            let target = stopwatch.elapsed_micros() + 2_000;
            let reached = policy.wait_until(&stopwatch, target, &stop).unwrap();
            assert!(reached >= target);
        }
    }

    #[test]
    fn test_wait_until_observes_stop() {
        let stopwatch = Stopwatch::new().unwrap();
        let stop = AtomicBool::new(true);
        let target = stopwatch.elapsed_micros() + 10_000_000;
        assert_eq!(
            WaitPolicy::Balanced.wait_until(&stopwatch, target, &stop),
            None
        );
        assert!(stopwatch.elapsed_micros() < 1_000_000);
    }
}
