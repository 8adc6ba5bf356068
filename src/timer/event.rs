/// Measurements carried by one delivered notification.
///
/// All times are in microseconds of the tick thread's stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    /// 1-based index of the tick since `start()`. Suppressed ticks consume an
    /// index too, so delivered indices may show gaps.
    pub tick_index: u64,
    /// Stopwatch reading when the tick fired.
    pub elapsed_micros: i64,
    /// Time since the previous tick's scheduled trigger, whether or not that
    /// tick was delivered. After suppressed ticks this is not the gap to the
    /// previous notification.
    pub delay_micros: i64,
    /// Actual fire time minus scheduled fire time, positive when late.
    pub lateness_micros: i64,
    /// Time spent between the previous scheduled trigger and the start of
    /// this tick's wait, mostly the previous handler run.
    pub previous_handler_execution_micros: i64,
}

impl TimerEvent {
    pub fn is_late(&self) -> bool {
        self.lateness_micros > 0
    }

    /// Delay deviation from the given interval.
    pub fn jitter_micros(&self, interval_micros: i64) -> i64 {
        self.delay_micros - interval_micros
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_and_lateness() {
        let event = TimerEvent {
            tick_index: 3,
            elapsed_micros: 3_020,
            delay_micros: 1_020,
            lateness_micros: 20,
            previous_handler_execution_micros: 5,
        };
        assert!(event.is_late());
        assert_eq!(event.jitter_micros(1_000), 20);

        let early = TimerEvent {
            lateness_micros: 0,
            ..event
        };
        assert!(!early.is_late());
    }
}
