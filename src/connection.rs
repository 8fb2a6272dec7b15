//! Simulated transport lifecycle
//!
//! Uninitialized -> Connecting -> Online, driven by timers on construction.
//! Ended is reachable from anywhere and is terminal.

use crate::broadcast::{BroadcastStream, StreamReader};
use crate::scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::rc::{Rc, Weak};
use std::time::Duration;
use thiserror::Error;

/// Delay before the transport reports Connecting
pub const CONNECTING_DELAY: Duration = Duration::from_millis(50);

/// Delay between Connecting and Online
pub const ONLINE_DELAY: Duration = Duration::from_millis(250);

/// Transport lifecycle states, numbered as Direct Line numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Uninitialized = 0,
    Connecting = 1,
    Online = 2,
    ExpiredToken = 3,
    FailedToConnect = 4,
    Ended = 5,
}

impl ConnectionStatus {
    pub fn is_terminal(self) -> bool {
        self == ConnectionStatus::Ended
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionStatus::Uninitialized => "uninitialized",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Online => "online",
            ConnectionStatus::ExpiredToken => "expired_token",
            ConnectionStatus::FailedToConnect => "failed_to_connect",
            ConnectionStatus::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Invalid connection transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionStatus,
        to: ConnectionStatus,
    },
}

/// Validate a status change. `Ok(None)` means the change is an accepted no-op.
pub fn transition(
    from: ConnectionStatus,
    to: ConnectionStatus,
) -> Result<Option<ConnectionStatus>, ConnectionError> {
    use ConnectionStatus::{Connecting, Ended, ExpiredToken, FailedToConnect, Online, Uninitialized};

    match (from, to) {
        (Ended, Ended) => Ok(None),
        (Uninitialized, Connecting)
        | (Connecting, Online | FailedToConnect)
        | (Online, ExpiredToken) => Ok(Some(to)),
        (_, Ended) => Ok(Some(Ended)),
        (from, to) => Err(ConnectionError::InvalidTransition { from, to }),
    }
}

/// Lifecycle state machine publishing every transition on its status stream
pub struct ConnectionStateMachine {
    status: BroadcastStream<ConnectionStatus>,
}

impl ConnectionStateMachine {
    /// Create the machine in Uninitialized and schedule the handshake.
    pub fn start(scheduler: &Rc<dyn Scheduler>) -> Rc<Self> {
        let status = BroadcastStream::new();
        status.push(ConnectionStatus::Uninitialized);
        let machine = Rc::new(Self { status });

        let weak = Rc::downgrade(&machine);
        let handshake_scheduler = Rc::downgrade(scheduler);
        scheduler.schedule(
            CONNECTING_DELAY,
            Box::new(move || {
                let Some(machine) = weak.upgrade() else {
                    return;
                };
                if machine.advance(ConnectionStatus::Connecting).is_err() {
                    return;
                }
                if let Some(scheduler) = handshake_scheduler.upgrade() {
                    let weak: Weak<Self> = Rc::downgrade(&machine);
                    scheduler.schedule(
                        ONLINE_DELAY,
                        Box::new(move || {
                            if let Some(machine) = weak.upgrade() {
                                let _ = machine.advance(ConnectionStatus::Online);
                            }
                        }),
                    );
                }
            }),
        );

        machine
    }

    pub fn current(&self) -> ConnectionStatus {
        self.status.last().unwrap_or(ConnectionStatus::Uninitialized)
    }

    pub fn reader(&self) -> StreamReader<ConnectionStatus> {
        self.status.reader()
    }

    /// Move to `to` if the transition table allows it, publishing the change.
    pub fn advance(&self, to: ConnectionStatus) -> Result<(), ConnectionError> {
        let from = self.current();
        match transition(from, to) {
            Ok(Some(next)) => {
                tracing::debug!(%from, to = %next, "Connection status changed");
                self.status.push(next);
                if next.is_terminal() {
                    self.status.complete();
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected connection transition");
                Err(e)
            }
        }
    }

    /// End the connection. Idempotent.
    pub fn close(&self) {
        let _ = self.advance(ConnectionStatus::Ended);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::VirtualScheduler;
    use std::cell::RefCell;

    fn started() -> (Rc<VirtualScheduler>, Rc<ConnectionStateMachine>) {
        let sched = VirtualScheduler::starting_now();
        let dyn_sched: Rc<dyn Scheduler> = sched.clone();
        let machine = ConnectionStateMachine::start(&dyn_sched);
        (sched, machine)
    }

    fn record(machine: &ConnectionStateMachine) -> Rc<RefCell<Vec<ConnectionStatus>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        machine
            .reader()
            .subscribe(move |s: &ConnectionStatus| sink.borrow_mut().push(*s));
        seen
    }

    #[test]
    fn test_handshake_reaches_online_on_schedule() {
        let (sched, machine) = started();
        let seen = record(&machine);

        sched.advance(CONNECTING_DELAY);
        assert_eq!(machine.current(), ConnectionStatus::Connecting);
        sched.advance(ONLINE_DELAY);

        assert_eq!(
            *seen.borrow(),
            vec![
                ConnectionStatus::Uninitialized,
                ConnectionStatus::Connecting,
                ConnectionStatus::Online
            ]
        );
    }

    #[test]
    fn test_late_subscriber_sees_online() {
        let (sched, machine) = started();
        sched.run_until_idle();

        let seen = record(&machine);

        assert_eq!(*seen.borrow(), vec![ConnectionStatus::Online]);
    }

    #[test]
    fn test_close_before_online_stops_handshake() {
        let (sched, machine) = started();
        let seen = record(&machine);

        machine.close();
        machine.close();
        sched.run_until_idle();

        assert_eq!(
            *seen.borrow(),
            vec![ConnectionStatus::Uninitialized, ConnectionStatus::Ended]
        );
        assert_eq!(machine.current(), ConnectionStatus::Ended);
    }

    #[test]
    fn test_transition_table() {
        use ConnectionStatus::*;

        assert_eq!(transition(Online, ExpiredToken), Ok(Some(ExpiredToken)));
        assert_eq!(transition(Connecting, FailedToConnect), Ok(Some(FailedToConnect)));
        assert_eq!(transition(FailedToConnect, Ended), Ok(Some(Ended)));
        assert_eq!(transition(Ended, Ended), Ok(None));
        assert_eq!(
            transition(Online, Connecting),
            Err(ConnectionError::InvalidTransition {
                from: Online,
                to: Connecting
            })
        );
        assert!(transition(Ended, Online).is_err());
        assert!(transition(Uninitialized, Online).is_err());
    }

    #[test]
    fn test_rejected_transition_does_not_publish() {
        let (sched, machine) = started();
        sched.run_until_idle();
        let seen = record(&machine);

        assert!(machine.advance(ConnectionStatus::Connecting).is_err());

        assert_eq!(*seen.borrow(), vec![ConnectionStatus::Online]);
    }
}
