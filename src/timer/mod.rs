pub mod builder;
pub mod clock;
pub mod event;
pub mod stats;
pub(crate) mod ticker;
pub mod timer;
pub mod wait;

pub use builder::{TimerBuilder, TimerConfig};
pub use clock::Stopwatch;
pub use event::TimerEvent;
pub use stats::TimerStats;
pub use timer::Timer;
pub use wait::WaitPolicy;
