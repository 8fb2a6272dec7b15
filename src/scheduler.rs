//! Logical clock and deferred task queue
//!
//! All delays in the simulator go through a [`Scheduler`] so tests can
//! drive time explicitly instead of waiting on the wall clock.

use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Duration;

/// A deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// Source of logical time and deferred execution
pub trait Scheduler {
    /// Time elapsed since the scheduler was created
    fn now(&self) -> Duration;

    /// Wall-clock style timestamp for the current logical instant
    fn timestamp(&self) -> DateTime<Utc>;

    /// Run `task` once `delay` has elapsed. There is no way to retract it.
    fn schedule(&self, delay: Duration, task: Task);
}

struct Timer {
    deadline: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest deadline first, then registration order
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Deterministic scheduler driven by explicit calls
pub struct VirtualScheduler {
    origin: DateTime<Utc>,
    now: Cell<Duration>,
    next_seq: Cell<u64>,
    queue: RefCell<BinaryHeap<Timer>>,
}

impl VirtualScheduler {
    pub fn new(origin: DateTime<Utc>) -> Rc<Self> {
        Rc::new(Self {
            origin,
            now: Cell::new(Duration::ZERO),
            next_seq: Cell::new(0),
            queue: RefCell::new(BinaryHeap::new()),
        })
    }

    /// Scheduler anchored at the current wall-clock time
    pub fn starting_now() -> Rc<Self> {
        Self::new(Utc::now())
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Deadline of the earliest waiting task
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow().peek().map(|timer| timer.deadline)
    }

    /// Fire the earliest task, moving the clock to its deadline.
    /// Returns false when nothing is queued.
    pub fn run_next(&self) -> bool {
        let Some(timer) = self.queue.borrow_mut().pop() else {
            return false;
        };
        if timer.deadline > self.now.get() {
            self.now.set(timer.deadline);
        }
        // Queue borrow is released so the task may schedule more work
        (timer.task)();
        true
    }

    /// Fire every task due within `by`, then settle the clock at `now + by`.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        while self.next_deadline().is_some_and(|deadline| deadline <= target) {
            self.run_next();
        }
        self.now.set(target);
    }

    /// Fire tasks until the queue is empty. Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while self.run_next() {
            fired += 1;
        }
        fired
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.now.get()).unwrap_or(chrono::Duration::zero());
        self.origin + elapsed
    }

    fn schedule(&self, delay: Duration, task: Task) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.queue.borrow_mut().push(Timer {
            deadline: self.now.get() + delay,
            seq,
            task,
        });
    }
}
