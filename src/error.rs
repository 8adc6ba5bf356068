use std::time::Duration;

use thiserror::Error;

/// Error type returned by tick handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum TimerError {
    #[error("high resolution counter unavailable (observed resolution: {resolution:?})")]
    UnsupportedPlatform { resolution: Option<Duration> },
    #[error("no tick handler subscribed")]
    NoHandler,
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[from] std::io::Error),
}
