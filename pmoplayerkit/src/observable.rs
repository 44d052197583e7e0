//! Synchronous publish/subscribe contract shared by the backend players and
//! the queue player.
//!
//! An [`Observable`] owns an ordered list of observers and delivers every
//! event to each of them, in registration order, before `notify` returns.
//! The same observer may be registered several times; it then receives the
//! event once per registration.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Receiver side of the contract.
pub trait Observer<E>: Send + Sync {
    fn listen(&self, event: &E);
}

/// Any `Fn(&E)` closure can observe.
impl<E, F> Observer<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn listen(&self, event: &E) {
        self(event)
    }
}

pub type ObserverRef<E> = Arc<dyn Observer<E>>;

/// Ordered, duplicate-tolerant observer storage.
///
/// Delivery iterates over a snapshot of the list, so an observer may add or
/// remove observers while handling an event without deadlocking; the change
/// takes effect from the next event.
pub struct ObserverList<E> {
    observers: Mutex<Vec<ObserverRef<E>>>,
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}

impl<E> ObserverList<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: ObserverRef<E>) {
        self.observers
            .lock()
            .expect("Observer list mutex poisoned")
            .push(observer);
    }

    /// Removes the first registration of `observer` (pointer identity).
    /// Returns false when the observer was not registered.
    pub fn remove(&self, observer: &ObserverRef<E>) -> bool {
        let mut observers = self.observers.lock().expect("Observer list mutex poisoned");
        match observers.iter().position(|o| Arc::ptr_eq(o, observer)) {
            Some(index) => {
                observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<ObserverRef<E>> {
        self.observers
            .lock()
            .expect("Observer list mutex poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.observers
            .lock()
            .expect("Observer list mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, event: &E) {
        for observer in self.snapshot() {
            observer.listen(event);
        }
    }
}

/// Sender side of the contract.
///
/// Implementors only expose their [`ObserverList`]; registration and fan-out
/// are provided.
pub trait Observable {
    type Event;

    fn observers(&self) -> &ObserverList<Self::Event>;

    fn add_observer(&self, observer: ObserverRef<Self::Event>) {
        self.observers().add(observer);
    }

    fn remove_observer(&self, observer: &ObserverRef<Self::Event>) -> bool {
        self.observers().remove(observer)
    }

    fn notify(&self, event: &Self::Event) {
        self.observers().notify(event);
    }
}
