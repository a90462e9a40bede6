//! Playing session of a single user
//!
//! A session owns everything the renderer draws: the local board, its orientation, the
//! selection and the assigned role. Clicks and ticks are delivered by the caller from one
//! thread and never overlap.

use crate::board::{Board, MalformedNotation};
use crate::config::SyncConfig;
use crate::moves::{Move, MoveError, MoveKind};
use crate::orient::Orientation;
use crate::peer::{Peer, PeerError};
use crate::protocol::{Assignment, ProtocolError, Request, Status};
use crate::select::{ClickOutcome, Selection};
use crate::sync::{Action, Poller};
use crate::types::{Color, Coord};

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("peer error: {0}")]
    Peer(#[from] PeerError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("malformed position: {0}")]
    Notation(#[from] MalformedNotation),
    #[error("{0}")]
    Move(#[from] MoveError),
    #[error("request refused: {0}")]
    Refused(String),
    #[error("game not started")]
    NotStarted,
    #[error("not your turn")]
    NotYourTurn,
}

fn check_ack(reply: String) -> Result<String, SessionError> {
    if reply.starts_with("<err") {
        return Err(SessionError::Refused(reply));
    }
    Ok(reply)
}

pub struct Session<P: Peer> {
    peer: P,
    board: Board,
    orientation: Orientation,
    role: Option<Color>,
    selection: Selection,
    poller: Poller,
    user_id: Option<String>,
    user_name: Option<String>,
}

impl<P: Peer> Session<P> {
    pub fn new(peer: P, config: &SyncConfig) -> Session<P> {
        Session {
            peer,
            board: Board::initial(),
            orientation: Orientation::Normal,
            role: None,
            selection: Selection::Idle,
            poller: Poller::new(config.waiting_interval(), config.started_interval()),
            user_id: None,
            user_name: config.user_name.clone(),
        }
    }

    /// Returns the local board, as seen by the player
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[inline]
    pub fn role(&self) -> Option<Color> {
        self.role
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.poller.is_started()
    }

    #[inline]
    pub fn is_my_turn(&self) -> bool {
        self.poller.is_my_turn()
    }

    #[inline]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    #[inline]
    pub fn peer(&self) -> &P {
        &self.peer
    }

    /// Returns the delay before the next tick
    #[inline]
    pub fn next_delay(&self) -> Duration {
        self.poller.next_delay()
    }

    /// Obtains a user id and enters the match queue
    pub fn connect(&mut self) -> Result<&str, SessionError> {
        let id = check_ack(self.peer.call(&Request::GetUserId(self.user_name.clone()))?)?;
        self.peer.set_user(&id);
        info!("connected as {}", id);
        let user_id: &str = self.user_id.insert(id);
        check_ack(self.peer.call(&Request::Allocate)?)?;
        Ok(user_id)
    }

    /// Handles a click on a square, or outside the board for `None`
    ///
    /// Clicks are ignored until the game starts. A completed move is applied and pushed
    /// only on the player's turn; otherwise it is dropped and the selection is cleared.
    pub fn click(&mut self, target: Option<Coord>) -> Result<ClickOutcome, SessionError> {
        let role = match self.role {
            Some(role) if self.poller.is_started() => role,
            _ => return Ok(ClickOutcome::Ignored),
        };
        let outcome = self.selection.click(&self.board, role, target);
        if let ClickOutcome::Moved(mv) = outcome {
            if !self.poller.is_my_turn() {
                debug!("dropping move while waiting for opponent");
                return Ok(ClickOutcome::Deselected);
            }
            self.push_move(mv, role)?;
        }
        Ok(outcome)
    }

    /// Validates, applies and pushes a move
    pub fn play(&mut self, mv: Move) -> Result<MoveKind, SessionError> {
        let role = match self.role {
            Some(role) if self.poller.is_started() => role,
            _ => return Err(SessionError::NotStarted),
        };
        if !self.poller.is_my_turn() {
            return Err(SessionError::NotYourTurn);
        }
        mv.validate(&self.board, role)?;
        self.selection.clear();
        self.push_move(mv, role)
    }

    fn push_move(&mut self, mv: Move, role: Color) -> Result<MoveKind, SessionError> {
        let prev = self.board;
        let kind = mv.make(&mut self.board, role)?;
        let notation = self.board.encode_oriented(self.orientation);
        debug!("pushing {}", mv.styled(self.orientation));
        match self
            .peer
            .call(&Request::SetFen(notation))
            .map_err(SessionError::from)
            .and_then(check_ack)
        {
            Ok(_) => {
                self.poller.moved();
                Ok(kind)
            }
            Err(e) => {
                warn!("push failed, move reverted: {}", e);
                self.board = prev;
                Err(e)
            }
        }
    }

    fn fetch(&mut self) -> Result<Assignment, SessionError> {
        Ok(Assignment::parse(&self.peer.call(&Request::GetFen)?)?)
    }

    fn adopt_assignment(&mut self) -> Result<(), SessionError> {
        let a = self.fetch()?;
        let orientation = Orientation::for_role(a.role);
        self.board = Board::decode_oriented(&a.notation, orientation)?;
        self.orientation = orientation;
        self.role = Some(a.role);
        self.selection.clear();
        self.poller.start();
        info!("game started, playing {}", a.role);
        Ok(())
    }

    /// Performs one polling step
    ///
    /// On error, no state is changed and the next tick retries. In particular, a turn
    /// whose position could not be fetched does not count as the player's turn yet, so
    /// moves stay refused until a later tick adopts the position.
    pub fn tick(&mut self) -> Result<Status, SessionError> {
        let status = Status::parse(&self.peer.call(&Request::Status)?)?;
        match self.poller.observe(status) {
            Action::Idle => {}
            Action::FetchAssignment => self.adopt_assignment()?,
            Action::FetchPosition(ticket) => {
                let fetched = self.fetch().and_then(|a| {
                    Ok(Board::decode_oriented(&a.notation, self.orientation)?)
                });
                let board = match fetched {
                    Ok(board) => board,
                    Err(e) => {
                        self.poller.fetch_failed(ticket);
                        return Err(e);
                    }
                };
                // Moves are refused until the fetch is adopted and the fetch completes
                // within this call, so the ticket is always current here.
                if self.poller.accept(ticket) {
                    debug!("adopted {}", board);
                    self.board = board;
                    self.selection.clear();
                } else {
                    debug!("discarding stale position");
                }
            }
        }
        Ok(status)
    }

    /// Ticks periodically until `stop` is set
    ///
    /// `on_tick` is called after each tick with its result. Failed ticks are logged and
    /// the loop goes on.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut on_tick: F)
    where
        F: FnMut(&mut Self, &Result<Status, SessionError>),
    {
        while !stop.load(Ordering::Relaxed) {
            let res = self.tick();
            if let Err(e) = &res {
                warn!("tick failed: {}", e);
            }
            on_tick(self, &res);
            thread::sleep(self.next_delay());
        }
    }
}
