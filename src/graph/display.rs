use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    error::HandlerError,
    graph::{Band, GraphRecorder, IngestMode, JitterSummary, MAX_CAPACITY},
    handler::{SubscriptionId, TickHandler},
    timer::{Timer, TimerEvent},
};

/// Seconds of history a graph keeps at the timer's interval.
const WINDOW_MICROS: i64 = 5_000_000;
/// Full scale of the chart, in intervals.
const SCALE_INTERVALS: i64 = 5;

/// Which measurement of a tick is charted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GraphSource {
    /// Gap between triggers; shows how precise the timer is.
    #[default]
    Delay,
    /// Time the previous tick's handlers took.
    HandlerExecution,
}

impl GraphSource {
    fn sample(self, event: &TimerEvent) -> i64 {
        match self {
            GraphSource::Delay => event.delay_micros,
            GraphSource::HandlerExecution => event.previous_handler_execution_micros,
        }
    }
}

/// A [`GraphRecorder`] fed by timer notifications.
///
/// Cloning shares the recorder, so one clone can be subscribed to the timer
/// while another is read by the renderer.
#[derive(Debug, Clone)]
pub struct TimerGraph {
    recorder: Arc<Mutex<GraphRecorder>>,
    source: GraphSource,
    mode: IngestMode,
}

impl TimerGraph {
    /// Sized for five seconds of ticks, good up to one interval, full scale
    /// at five intervals.
    pub fn for_interval(interval_micros: i64, source: GraphSource, mode: IngestMode) -> Self {
        let interval = interval_micros.max(1);
        let capacity = usize::try_from(WINDOW_MICROS / interval)
            .unwrap_or(MAX_CAPACITY)
            .clamp(1, MAX_CAPACITY);

        let mut recorder = GraphRecorder::new(capacity);
        recorder.set_max(interval.saturating_mul(SCALE_INTERVALS) as f32);
        recorder.set_limit(interval as f32);

        TimerGraph {
            recorder: Arc::new(Mutex::new(recorder)),
            source,
            mode,
        }
    }

    /// Creates a graph for `timer`'s current interval and subscribes it.
    pub fn attach(timer: &Timer, source: GraphSource, mode: IngestMode) -> (Self, SubscriptionId) {
        let graph = Self::for_interval(timer.interval_micros(), source, mode);
        let id = timer.subscribe(graph.clone());
        (graph, id)
    }

    fn recorder(&self) -> MutexGuard<'_, GraphRecorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn source(&self) -> GraphSource {
        self.source
    }

    pub fn record(&self, event: &TimerEvent) {
        let value = self.source.sample(event) as f32;
        self.recorder().record(self.mode, value);
    }

    pub fn with_recorder<R>(&self, f: impl FnOnce(&mut GraphRecorder) -> R) -> R {
        f(&mut self.recorder())
    }

    pub fn samples(&self) -> Vec<f32> {
        self.recorder().samples()
    }

    pub fn bands(&self) -> Vec<Band> {
        self.recorder().bands()
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        self.recorder().summary()
    }

    pub fn sparkline(&self) -> String {
        self.recorder().sparkline()
    }
}

impl TickHandler for TimerGraph {
    fn on_tick(&self, event: &TimerEvent) -> Result<(), HandlerError> {
        self.record(event);
        Ok(())
    }
}
