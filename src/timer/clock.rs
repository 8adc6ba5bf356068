use std::{
    sync::OnceLock,
    time::{Duration, Instant},
};

use crate::error::TimerError;

/// Coarsest counter step still accepted as high resolution.
pub const MAX_COUNTER_RESOLUTION: Duration = Duration::from_micros(10);

const PROBE_ROUNDS: u32 = 1_000_000;
const PROBE_SAMPLES: u32 = 64;

static COUNTER_RESOLUTION: OnceLock<Option<Duration>> = OnceLock::new();

/// Smallest observable step of the monotonic counter, probed once per process.
///
/// `None` means the counter never advanced while probing.
pub fn counter_resolution() -> Option<Duration> {
    *COUNTER_RESOLUTION.get_or_init(probe_resolution)
}

/// True if the host counter can resolve sub-[`MAX_COUNTER_RESOLUTION`] steps.
pub fn is_high_resolution() -> bool {
    check_resolution(counter_resolution()).is_ok()
}

pub(crate) fn ensure_high_resolution() -> Result<(), TimerError> {
    check_resolution(counter_resolution())
}

pub(crate) fn check_resolution(resolution: Option<Duration>) -> Result<(), TimerError> {
    match resolution {
        Some(step) if step <= MAX_COUNTER_RESOLUTION => Ok(()),
        _ => Err(TimerError::UnsupportedPlatform { resolution }),
    }
}

fn probe_resolution() -> Option<Duration> {
    let mut finest: Option<Duration> = None;
    let mut samples = 0;
    let mut last = Instant::now();

    for _ in 0..PROBE_ROUNDS {
        let now = Instant::now();
        let step = now.duration_since(last);
        if !step.is_zero() {
            finest = Some(finest.map_or(step, |f| f.min(step)));
            samples += 1;
            if samples == PROBE_SAMPLES {
                break;
            }
        }
        last = now;
    }

    tracing::debug!(?finest, samples, "probed monotonic counter");
    finest
}

pub(crate) fn as_micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Monotonic elapsed-time source with microsecond readings.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    origin: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch already started at "now".
    ///
    /// Fails with [`TimerError::UnsupportedPlatform`] when the host counter
    /// cannot deliver sub-millisecond precision.
    pub fn new() -> Result<Self, TimerError> {
        ensure_high_resolution()?;
        Ok(Self {
            origin: Instant::now(),
        })
    }

    /// Resets the origin to now.
    pub fn start(&mut self) {
        self.origin = Instant::now();
    }

    /// Resets the origin to now and returns the microseconds elapsed before the reset.
    pub fn restart(&mut self) -> i64 {
        let now = Instant::now();
        let elapsed = as_micros(now.duration_since(self.origin));
        self.origin = now;
        elapsed
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn elapsed_micros(&self) -> i64 {
        as_micros(self.origin.elapsed())
    }
}
