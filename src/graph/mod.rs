//! Strip-chart recording of timer measurements.
//!
//! Used to eyeball and check tick jitter: a [`TimerGraph`] subscribed to a
//! timer feeds each event's delay (or previous handler execution time) into a
//! fixed capacity [`GraphRecorder`].

pub mod display;
pub mod recorder;

pub use display::{GraphSource, TimerGraph};
pub use recorder::{Band, GraphRecorder, IngestMode, JitterSummary, MAX_CAPACITY};
