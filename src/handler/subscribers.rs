use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    handler::{SubscriptionId, TickHandler},
    timer::TimerEvent,
};

#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) id: SubscriptionId,
    pub(crate) handler: Arc<dyn TickHandler>,
}

/// Ordered handler list.
///
/// Copy-on-write: delivery works on a snapshot, so handlers may subscribe or
/// unsubscribe from inside a tick without deadlocking. Changes apply from the
/// next tick on.
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    entries: Mutex<Arc<Vec<Subscriber>>>,
}

impl Subscribers {
    pub(crate) fn new() -> Self {
        Subscribers {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Arc::new(Vec::new())),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Arc<Vec<Subscriber>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(&self, handler: Arc<dyn TickHandler>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries();
        Arc::make_mut(&mut *entries).push(Subscriber { id, handler });
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let Some(pos) = entries.iter().position(|s| s.id == id) else {
            return false;
        };
        Arc::make_mut(&mut *entries).remove(pos);
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Subscriber>> {
        Arc::clone(&*self.entries())
    }

    /// Invokes every handler in subscription order. Returns the number of faults.
    pub(crate) fn deliver(&self, event: &TimerEvent) -> u64 {
        let mut faults = 0;
        for subscriber in self.snapshot().iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.handler.on_tick(event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    faults += 1;
                    tracing::error!(
                        tick = event.tick_index,
                        subscription = subscriber.id,
                        %error,
                        "tick handler failed"
                    );
                }
                Err(payload) => {
                    faults += 1;
                    tracing::error!(
                        tick = event.tick_index,
                        subscription = subscriber.id,
                        panic = panic_message(payload.as_ref()),
                        "tick handler panicked"
                    );
                }
            }
        }
        faults
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn event(tick_index: u64) -> TimerEvent {
        TimerEvent {
            tick_index,
            elapsed_micros: 0,
            delay_micros: 0,
            lateness_micros: 0,
            previous_handler_execution_micros: 0,
        }
    }

    #[test]
    fn test_delivery_follows_subscription_order() {
        let subscribers = Subscribers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            subscribers.subscribe(Arc::new(move |_: &TimerEvent| {
                seen.lock().unwrap().push(tag);
            }));
        }

        assert_eq!(subscribers.deliver(&event(1)), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe() {
        let subscribers = Subscribers::new();
        let first = subscribers.subscribe(Arc::new(|_: &TimerEvent| {}));
        let second = subscribers.subscribe(Arc::new(|_: &TimerEvent| {}));
        assert_ne!(first, second);
        assert_eq!(subscribers.snapshot().len(), 2);

        assert!(subscribers.unsubscribe(first));
        assert!(!subscribers.unsubscribe(first));
        assert_eq!(subscribers.snapshot().len(), 1);
        assert_eq!(subscribers.snapshot()[0].id, second);
    }

    #[test]
    fn test_faults_are_contained() {
        struct Failing;
        impl TickHandler for Failing {
            fn on_tick(&self, _: &TimerEvent) -> Result<(), crate::HandlerError> {
                Err("boom".into())
            }
        }

        let subscribers = Subscribers::new();
        let reached = Arc::new(AtomicU64::new(0));
        subscribers.subscribe(Arc::new(|_: &TimerEvent| -> () { panic!("handler panic") }));
        subscribers.subscribe(Arc::new(Failing));
        let counter = Arc::clone(&reached);
        subscribers.subscribe(Arc::new(move |_: &TimerEvent| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        assert_eq!(subscribers.deliver(&event(1)), 2);
        assert_eq!(reached.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }
}
