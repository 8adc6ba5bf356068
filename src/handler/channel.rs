use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_channel::{Receiver, Sender, TrySendError};

use crate::{error::HandlerError, handler::TickHandler, timer::TimerEvent};

/// Creates a handler forwarding events into a bounded channel.
///
/// The tick thread never blocks on the channel: when it is full the event is
/// dropped and counted.
pub fn channel(capacity: usize) -> (ChannelSink, Receiver<TimerEvent>) {
    let (sender, receiver) = async_channel::bounded(capacity.max(1));
    let sink = ChannelSink {
        sender,
        dropped: Arc::new(AtomicU64::new(0)),
        closed_reported: Arc::new(AtomicBool::new(false)),
    };
    (sink, receiver)
}

#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<TimerEvent>,
    dropped: Arc<AtomicU64>,
    closed_reported: Arc<AtomicBool>,
}

impl ChannelSink {
    /// Number of events dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl TickHandler for ChannelSink {
    fn on_tick(&self, event: &TimerEvent) -> Result<(), HandlerError> {
        match self.sender.try_send(*event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(tick = event.tick_index, "event channel full, dropping");
                Ok(())
            }
            // Reported once; later ticks are dropped silently.
            Err(TrySendError::Closed(_)) => {
                if self.closed_reported.swap(true, Ordering::Relaxed) {
                    Ok(())
                } else {
                    Err("event receiver closed".into())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tick_index: u64) -> TimerEvent {
        TimerEvent {
            tick_index,
            elapsed_micros: tick_index as i64 * 1_000,
            delay_micros: 1_000,
            lateness_micros: 0,
            previous_handler_execution_micros: 0,
        }
    }

    #[tokio::test]
    async fn test_forwards_events_in_order() {
        let (sink, receiver) = channel(8);
        for i in 1..=3 {
            sink.on_tick(&event(i)).unwrap();
        }
        for i in 1..=3 {
            assert_eq!(receiver.recv().await.unwrap().tick_index, i);
        }
        assert_eq!(sink.dropped(), 0);
    }

    #[tokio::test]
    async fn test_full_channel_drops() {
        let (sink, receiver) = channel(2);
        let observer = sink.clone();
        for i in 1..=5 {
            sink.on_tick(&event(i)).unwrap();
        }
        assert_eq!(observer.dropped(), 3);
        assert_eq!(receiver.recv().await.unwrap().tick_index, 1);
        assert_eq!(receiver.recv().await.unwrap().tick_index, 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (sink, receiver) = channel(0);
        sink.on_tick(&event(1)).unwrap();
        assert_eq!(receiver.try_recv().unwrap().tick_index, 1);
    }

    #[test]
    fn test_closed_channel_reports_once() {
        let (sink, receiver) = channel(1);
        drop(receiver);
        assert!(sink.is_closed());
        assert!(sink.on_tick(&event(1)).is_err());
        assert!(sink.on_tick(&event(2)).is_ok());
    }
}
