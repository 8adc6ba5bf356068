use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
    thread::{self, JoinHandle, ThreadId},
    time::{Duration, Instant},
};

use crate::{
    error::TimerError,
    handler::{SubscriptionId, TickHandler, subscribers::Subscribers},
    timer::{
        TimerConfig, TimerStats, WaitPolicy, clock, clock::as_micros, stats::Counters,
        ticker::Ticker,
    },
};

const LATE_THRESHOLD_DISABLED: i64 = i64::MAX;
const STOP_POLL: Duration = Duration::from_micros(200);

/// State shared between the owner and the tick thread.
pub(crate) struct Shared {
    pub(crate) interval_micros: AtomicI64,
    pub(crate) late_threshold_micros: AtomicI64,
    pub(crate) subscribers: Subscribers,
    pub(crate) stats: Counters,
    /// Held by the tick loop for its whole run.
    pub(crate) loop_guard: Mutex<()>,
    /// Threads of every run still alive, including detached ones waiting
    /// for `loop_guard`.
    pub(crate) tick_threads: Mutex<Vec<ThreadId>>,
}

impl Shared {
    /// Registers the calling thread as a tick thread until the returned guard drops.
    pub(crate) fn enter_tick_thread(&self) -> TickThread<'_> {
        let id = thread::current().id();
        self.tick_threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
        TickThread { shared: self, id }
    }

    /// True when called from any tick thread of this timer, where joining
    /// could wait on ourselves.
    pub(crate) fn is_tick_thread(&self) -> bool {
        let current = thread::current().id();
        self.tick_threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&current)
    }
}

pub(crate) struct TickThread<'a> {
    shared: &'a Shared,
    id: ThreadId,
}

impl Drop for TickThread<'_> {
    fn drop(&mut self) {
        let mut threads = self
            .shared
            .tick_threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = threads.iter().position(|id| *id == self.id) {
            threads.swap_remove(pos);
        }
    }
}

struct Worker {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn join(self) {
        if self.handle.join().is_err() {
            tracing::error!("tick thread panicked");
        }
    }
}

/// Periodic timer driven by a dedicated thread.
///
/// Every tick is scheduled from the run's origin, so lateness of one tick
/// does not shift the following ones. Subscribed handlers are called inline on
/// the tick thread in subscription order; notifications never overlap.
pub struct Timer {
    shared: Arc<Shared>,
    wait_policy: WaitPolicy,
    clock_restart: Option<Duration>,
    thread_name: String,
    worker: Mutex<Option<Worker>>,
}

impl Timer {
    /// Creates an idle timer ticking every `interval_micros` once started.
    ///
    /// Fails when the host has no high resolution counter.
    pub fn new(interval_micros: i64) -> Result<Self, TimerError> {
        Self::with_config(TimerConfig {
            interval_micros,
            ..TimerConfig::default()
        })
    }

    pub fn with_config(config: TimerConfig) -> Result<Self, TimerError> {
        clock::ensure_high_resolution()?;

        let late_threshold = match config.late_threshold_micros {
            Some(threshold) if threshold > 0 => threshold,
            _ => LATE_THRESHOLD_DISABLED,
        };

        Ok(Timer {
            shared: Arc::new(Shared {
                interval_micros: AtomicI64::new(config.interval_micros),
                late_threshold_micros: AtomicI64::new(late_threshold),
                subscribers: Subscribers::new(),
                stats: Counters::default(),
                loop_guard: Mutex::new(()),
                tick_threads: Mutex::new(Vec::new()),
            }),
            wait_policy: config.wait_policy,
            clock_restart: config.clock_restart,
            thread_name: config.thread_name,
            worker: Mutex::new(None),
        })
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval_micros(&self) -> i64 {
        self.shared.interval_micros.load(Ordering::Relaxed)
    }

    /// Takes effect from the next scheduled tick.
    pub fn set_interval_micros(&self, interval_micros: i64) {
        self.shared
            .interval_micros
            .store(interval_micros, Ordering::Relaxed);
    }

    /// `None` when late ticks are always delivered.
    pub fn late_threshold_micros(&self) -> Option<i64> {
        match self.shared.late_threshold_micros.load(Ordering::Relaxed) {
            LATE_THRESHOLD_DISABLED => None,
            threshold => Some(threshold),
        }
    }

    /// Non-positive values disable suppression.
    pub fn set_late_threshold_micros(&self, threshold_micros: i64) {
        let threshold = if threshold_micros <= 0 {
            LATE_THRESHOLD_DISABLED
        } else {
            threshold_micros
        };
        self.shared
            .late_threshold_micros
            .store(threshold, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.worker()
            .as_ref()
            .is_some_and(|w| !w.stop.load(Ordering::Acquire) && !w.handle.is_finished())
    }

    pub fn set_running(&self, running: bool) -> Result<(), TimerError> {
        if running {
            self.start()
        } else {
            self.stop(true);
            Ok(())
        }
    }

    pub fn subscribe<H: TickHandler>(&self, handler: H) -> SubscriptionId {
        self.shared.subscribers.subscribe(Arc::new(handler))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.subscribers.unsubscribe(id)
    }

    /// Ticks scheduled since the last start, suppressed ones included.
    pub fn tick_count(&self) -> u64 {
        self.shared.stats.scheduled()
    }

    pub fn stats(&self) -> TimerStats {
        self.shared.stats.snapshot()
    }

    /// Spawns the tick thread.
    ///
    /// Does nothing if the timer is already running or the interval is not
    /// positive. Fails if no handler is subscribed or the thread cannot be
    /// spawned.
    pub fn start(&self) -> Result<(), TimerError> {
        let mut slot = self.worker();
        if let Some(worker) = slot.as_ref() {
            if !worker.stop.load(Ordering::Acquire) && !worker.handle.is_finished() {
                return Ok(());
            }
        }

        let interval = self.interval_micros();
        if interval <= 0 {
            tracing::warn!(interval, "timer interval is not positive, not starting");
            return Ok(());
        }
        if self.shared.subscribers.is_empty() {
            return Err(TimerError::NoHandler);
        }

        // A stopping worker that was not joined is left detached; the loop
        // guard keeps it from overlapping with the new run.
        if let Some(previous) = slot.take() {
            if previous.handle.is_finished() {
                previous.join();
            }
        }

        self.shared.stats.reset();
        let stop = Arc::new(AtomicBool::new(false));
        let ticker = Ticker {
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&stop),
            wait_policy: self.wait_policy,
            clock_restart_micros: self.clock_restart.map(as_micros),
            interval_micros: interval,
        };
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || ticker.run())?;

        tracing::debug!(interval, thread = %self.thread_name, "timer started");
        *slot = Some(Worker { handle, stop });
        Ok(())
    }

    /// Asks the tick thread to stop.
    ///
    /// With `join`, blocks until the thread has exited, unless called from the
    /// timer's tick threads (from a handler), in which case it only raises
    /// the stop flag and returns.
    pub fn stop(&self, join: bool) {
        let mut slot = self.worker();
        let Some(worker) = slot.as_ref() else {
            return;
        };
        worker.stop.store(true, Ordering::Release);
        if !join || self.shared.is_tick_thread() {
            return;
        }

        let Some(worker) = slot.take() else {
            return;
        };
        // Release the slot first: a handler may call stop() while we join.
        drop(slot);
        worker.join();
        tracing::debug!("timer stopped");
    }

    /// Stops and waits up to `timeout` for the tick thread to exit.
    ///
    /// Returns `false` on timeout, leaving the thread owned by the timer so a
    /// later `stop(true)` can join it.
    pub fn stop_and_wait(&self, timeout: Duration) -> bool {
        let target = {
            let slot = self.worker();
            let Some(worker) = slot.as_ref() else {
                return true;
            };
            worker.stop.store(true, Ordering::Release);
            if self.shared.is_tick_thread() {
                return true;
            }
            worker.handle.thread().id()
        };

        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut slot = self.worker();
                let finished = match slot.as_ref() {
                    Some(worker) if worker.handle.thread().id() == target => {
                        worker.handle.is_finished()
                    }
                    // Joined or replaced by someone else.
                    _ => return true,
                };
                if finished {
                    if let Some(worker) = slot.take() {
                        worker.join();
                    }
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(STOP_POLL);
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop(true);
    }
}
