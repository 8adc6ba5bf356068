//! A high resolution periodic timer.
//!
//! A [`Timer`] owns one dedicated thread that waits for each scheduled tick
//! and invokes its subscribed [`TickHandler`]s inline. The schedule is always
//! computed from a fixed origin, so a slow tick never shifts the ones after
//! it. Handlers run one after another on the tick thread, never concurrently.
//!
//! ```no_run
//! use microtimer::{Timer, TimerEvent};
//!
//! let timer = Timer::new(1_000)?;
//! timer.subscribe(|event: &TimerEvent| {
//!     println!("tick {} late by {}us", event.tick_index, event.lateness_micros);
//! });
//! timer.start()?;
//! std::thread::sleep(std::time::Duration::from_millis(10));
//! timer.stop(true);
//! # Ok::<(), microtimer::TimerError>(())
//! ```

pub mod error;
pub mod graph;
pub mod handler;
pub mod timer;

pub use error::{HandlerError, TimerError};
pub use graph::{GraphRecorder, GraphSource, IngestMode, TimerGraph};
pub use handler::{ChannelSink, SubscriptionId, TickHandler, channel};
pub use timer::{Stopwatch, Timer, TimerBuilder, TimerConfig, TimerEvent, TimerStats, WaitPolicy};
