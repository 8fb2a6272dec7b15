//! Multicast, replay-last publish/subscribe
//!
//! Single-threaded: observers are called synchronously on the pushing
//! thread, in registration order. A push made while a broadcast is in
//! progress is queued and delivered after the current broadcast finishes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Terminal error signal carried by a stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StreamError(pub String);

/// Receiver of stream signals
pub trait Observer<T> {
    fn next(&mut self, value: &T);

    fn error(&mut self, _error: &StreamError) {}

    fn complete(&mut self) {}
}

impl<T, F> Observer<T> for F
where
    F: FnMut(&T),
{
    fn next(&mut self, value: &T) {
        self(value);
    }
}

type SharedObserver<T> = Rc<RefCell<dyn Observer<T>>>;

#[derive(Debug, Clone)]
enum Signal<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

struct Inner<T> {
    observers: Vec<(u64, SharedObserver<T>)>,
    last: Option<T>,
    terminal: Option<Signal<T>>,
    next_observer_id: u64,
    delivering: bool,
    queued: VecDeque<Signal<T>>,
}

/// Broadcast stream with replay-one semantics
pub struct BroadcastStream<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T: Clone + 'static> BroadcastStream<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                observers: Vec::new(),
                last: None,
                terminal: None,
                next_observer_id: 0,
                delivering: false,
                queued: VecDeque::new(),
            })),
        }
    }

    /// Register an observer. The last pushed value, if any, is replayed to it
    /// immediately, followed by the terminal signal if the stream has ended.
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        let observer: SharedObserver<T> = Rc::new(RefCell::new(observer));
        let (id, replay, terminal) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_observer_id;
            inner.next_observer_id += 1;
            if inner.terminal.is_none() {
                inner.observers.push((id, Rc::clone(&observer)));
            }
            (id, inner.last.clone(), inner.terminal.clone())
        };

        if let Some(value) = replay {
            observer.borrow_mut().next(&value);
        }
        if let Some(signal) = terminal {
            deliver_one(&observer, &signal);
        }

        let inner: Rc<RefCell<dyn Unsubscribe>> = self.inner.clone();
        Subscription {
            inner: Rc::downgrade(&inner),
            id,
        }
    }

    /// Deliver a value to every registered observer before returning.
    pub fn push(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.terminal.is_some() {
                return;
            }
            inner.last = Some(value.clone());
        }
        self.dispatch(Signal::Next(value));
    }

    /// Broadcast a terminal error; nothing is delivered afterwards.
    pub fn error(&self, error: StreamError) {
        self.terminate(Signal::Error(error));
    }

    /// Broadcast completion; nothing is delivered afterwards.
    pub fn complete(&self) {
        self.terminate(Signal::Complete);
    }

    /// Most recently pushed value
    pub fn last(&self) -> Option<T> {
        self.inner.borrow().last.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminal.is_some()
    }

    #[allow(dead_code)] // Used by tests
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Read-only view that can subscribe but not push
    pub fn reader(&self) -> StreamReader<T> {
        StreamReader {
            inner: Rc::clone(&self.inner),
        }
    }

    fn terminate(&self, signal: Signal<T>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.terminal.is_some() {
                return;
            }
            inner.terminal = Some(signal.clone());
        }
        self.dispatch(signal);
    }

    fn dispatch(&self, signal: Signal<T>) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.delivering {
                inner.queued.push_back(signal);
                return;
            }
            inner.delivering = true;
        }

        let mut current = Some(signal);
        while let Some(signal) = current {
            let snapshot: Vec<(u64, SharedObserver<T>)> = self.inner.borrow().observers.clone();
            for (id, observer) in snapshot {
                // Skip observers released earlier in this same broadcast
                let registered = self
                    .inner
                    .borrow()
                    .observers
                    .iter()
                    .any(|(other, _)| *other == id);
                if registered {
                    deliver_one(&observer, &signal);
                }
            }

            let mut inner = self.inner.borrow_mut();
            if matches!(signal, Signal::Error(_) | Signal::Complete) {
                inner.observers.clear();
                inner.queued.clear();
            }
            current = inner.queued.pop_front();
            if current.is_none() {
                inner.delivering = false;
            }
        }
    }
}

impl<T: Clone + 'static> Default for BroadcastStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BroadcastStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

fn deliver_one<T>(observer: &SharedObserver<T>, signal: &Signal<T>) {
    let mut observer = observer.borrow_mut();
    match signal {
        Signal::Next(value) => observer.next(value),
        Signal::Error(error) => observer.error(error),
        Signal::Complete => observer.complete(),
    }
}

/// Subscribe-only view of a [`BroadcastStream`]
pub struct StreamReader<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T: Clone + 'static> StreamReader<T> {
    pub fn subscribe(&self, observer: impl Observer<T> + 'static) -> Subscription {
        self.stream().subscribe(observer)
    }

    pub fn last(&self) -> Option<T> {
        self.inner.borrow().last.clone()
    }

    #[allow(dead_code)] // Host-facing query
    pub fn is_terminated(&self) -> bool {
        self.inner.borrow().terminal.is_some()
    }

    fn stream(&self) -> BroadcastStream<T> {
        BroadcastStream {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for StreamReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

trait Unsubscribe {
    fn remove(&mut self, id: u64);
}

impl<T> Unsubscribe for Inner<T> {
    fn remove(&mut self, id: u64) {
        self.observers.retain(|(other, _)| *other != id);
    }
}

/// Handle to a registered observer
pub struct Subscription {
    inner: Weak<RefCell<dyn Unsubscribe>>,
    id: u64,
}

impl Subscription {
    /// Remove exactly this observer. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
