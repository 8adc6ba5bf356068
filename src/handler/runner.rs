use crate::{error::HandlerError, timer::TimerEvent};

/// Receiver of timer notifications.
///
/// Runs inline on the tick thread: the next tick cannot start waiting until
/// every handler has returned, so implementations must be quick.
pub trait TickHandler: Send + Sync + 'static {
    fn on_tick(&self, event: &TimerEvent) -> Result<(), HandlerError>;
}

impl<F> TickHandler for F
where
    F: Fn(&TimerEvent) + Send + Sync + 'static,
{
    fn on_tick(&self, event: &TimerEvent) -> Result<(), HandlerError> {
        self(event);
        Ok(())
    }
}
