use std::{
    sync::{
        Arc, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use crate::timer::{Stopwatch, TimerEvent, WaitPolicy, timer::Shared};

/// The tick loop of one run, executed on the timer's dedicated thread.
pub(crate) struct Ticker {
    pub(crate) shared: Arc<Shared>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) wait_policy: WaitPolicy,
    pub(crate) clock_restart_micros: Option<i64>,
    /// Interval observed by `start()`, always positive.
    pub(crate) interval_micros: i64,
}

impl Ticker {
    pub(crate) fn run(self) {
        let _registration = self.shared.enter_tick_thread();

        // A previous run that was stopped without joining may still be
        // finishing its last notification.
        let _owner = self
            .shared
            .loop_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.stop.load(Ordering::Acquire) {
            return;
        }

        let current = thread::current();
        let span = tracing::debug_span!("tick_loop", thread = current.name());
        let _enter = span.enter();

        let mut stopwatch = match Stopwatch::new() {
            Ok(stopwatch) => stopwatch,
            Err(error) => {
                tracing::error!(%error, "tick thread cannot start");
                return;
            }
        };

        // Clears anything a detached predecessor counted after `start()` reset.
        let shared = &self.shared;
        shared.stats.reset();

        let mut interval = self.interval_micros;
        let mut ignoring_interval = false;
        let mut next_trigger: i64 = 0;
        let mut tick_count: u64 = 0;

        tracing::debug!(interval, "tick loop started");

        while !self.stop.load(Ordering::Acquire) {
            let handler_execution = stopwatch.elapsed_micros().saturating_sub(next_trigger);

            let requested = shared.interval_micros.load(Ordering::Relaxed);
            if requested > 0 {
                interval = requested;
                ignoring_interval = false;
            } else if !ignoring_interval {
                ignoring_interval = true;
                tracing::warn!(requested, interval, "ignoring non-positive interval");
            }
            let late_threshold = shared.late_threshold_micros.load(Ordering::Relaxed);

            let last_trigger = next_trigger;
            // Saturates: an absurd interval parks the loop instead of wrapping.
            next_trigger = next_trigger.saturating_add(interval);
            tick_count += 1;
            shared.stats.set_scheduled(tick_count);

            let Some(elapsed) = self
                .wait_policy
                .wait_until(&stopwatch, next_trigger, &self.stop)
            else {
                break;
            };

            let lateness = elapsed.saturating_sub(next_trigger);
            if lateness >= late_threshold {
                shared.stats.record_suppressed();
                tracing::trace!(tick = tick_count, lateness, "suppressed late tick");
            } else {
                let event = TimerEvent {
                    tick_index: tick_count,
                    elapsed_micros: elapsed,
                    delay_micros: elapsed.saturating_sub(last_trigger),
                    lateness_micros: lateness,
                    previous_handler_execution_micros: handler_execution,
                };
                let faults = shared.subscribers.deliver(&event);
                shared.stats.record_delivery(faults);
            }

            if let Some(period) = self.clock_restart_micros {
                if stopwatch.elapsed_micros() >= period {
                    // Rebase so the schedule keeps its phase.
                    let shift = stopwatch.restart();
                    next_trigger = next_trigger.saturating_sub(shift);
                    tracing::debug!(shift, "restarted tick stopwatch");
                }
            }
        }

        tracing::debug!(ticks = tick_count, "tick loop stopped");
    }
}
