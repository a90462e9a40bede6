//! Polling state machine
//!
//! [`Poller`] performs no I/O by itself. It is fed with the statuses reported by the match
//! authority and answers with the requests to make next. The caller performs them and
//! reports back.

use crate::protocol::Status;

use std::time::Duration;

use log::debug;

/// Stamp of a position fetch
///
/// A fetched position may be adopted only while its ticket is current, see
/// [`Poller::accept()`]. A ticket goes stale when a local move is reported between issuing
/// the fetch and completing it. [`Session::tick()`](crate::Session::tick) issues and
/// completes the fetch within one call, so there it never does; callers which run the fetch
/// in the background while still taking moves rely on the check.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// What the caller should do after a status was observed
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Nothing to do until the next tick
    Idle,
    /// The game has just started: fetch the role and the initial position
    FetchAssignment,
    /// The turn has passed to the local player: fetch the position once
    FetchPosition(Ticket),
}

#[derive(Debug, Clone)]
pub struct Poller {
    started: bool,
    last: Status,
    fetched: u8,
    synced: bool,
    generation: u64,
    waiting_interval: Duration,
    started_interval: Duration,
}

impl Poller {
    pub fn new(waiting_interval: Duration, started_interval: Duration) -> Poller {
        Poller {
            started: false,
            last: Status::WaitingForGame,
            fetched: 0,
            synced: false,
            generation: 0,
            waiting_interval,
            started_interval,
        }
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the status observed last
    #[inline]
    pub fn last_status(&self) -> Status {
        self.last
    }

    /// Returns `true` if the local player is to move and the position of this turn was
    /// adopted
    #[inline]
    pub fn is_my_turn(&self) -> bool {
        self.started && self.synced && self.last == Status::YourTurn
    }

    /// Returns the delay before the next tick
    #[inline]
    pub fn next_delay(&self) -> Duration {
        if self.started {
            self.started_interval
        } else {
            self.waiting_interval
        }
    }

    /// Feeds a status observed on a tick
    pub fn observe(&mut self, status: Status) -> Action {
        if status != self.last {
            debug!("status {} -> {}", self.last, status);
        }
        self.last = status;
        if !self.started {
            return match status {
                Status::WaitingForGame => Action::Idle,
                _ => Action::FetchAssignment,
            };
        }
        match status {
            Status::WaitingForGame => Action::Idle,
            Status::OpponentTurn => {
                self.fetched = 0;
                Action::Idle
            }
            Status::YourTurn if self.fetched == 0 => {
                self.fetched = 1;
                self.synced = false;
                Action::FetchPosition(Ticket(self.generation))
            }
            Status::YourTurn => Action::Idle,
        }
    }

    /// Reports that the role and the initial position were adopted
    ///
    /// The fetch also counts as the position fetch of the current turn.
    pub fn start(&mut self) {
        self.started = true;
        self.synced = true;
        self.fetched = u8::from(self.last == Status::YourTurn);
    }

    /// Reports that the fetch issued with `ticket` failed, so the next tick retries it
    pub fn fetch_failed(&mut self, ticket: Ticket) {
        if ticket.0 == self.generation {
            self.fetched = 0;
        }
    }

    /// Checks whether a position fetched with `ticket` may still be adopted
    ///
    /// Any local move made after the fetch was issued makes the ticket stale. On success,
    /// the caller must adopt the position, as the turn counts as synced from now on.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.synced = true;
        true
    }

    /// Reports a local move that was pushed to the match authority
    ///
    /// The turn passes to the opponent, and all outstanding fetches become stale.
    pub fn moved(&mut self) {
        self.generation += 1;
        self.last = Status::OpponentTurn;
        self.fetched = 0;
    }
}

impl Default for Poller {
    fn default() -> Self {
        Poller::new(Duration::from_millis(1000), Duration::from_millis(200))
    }
}
