//! Pseudo-legal move generation
//!
//! Moves here obey the movement shape and blocking rules of each piece, but nobody checks
//! whether they leave the mover's own king under attack. The generator also has no notion of
//! whose turn it is.

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::moves::{Move, MoveKind};
use crate::types::{Color, Coord, Piece, Probe};
use chessmen_base::geometry;

use std::ops::{Deref, DerefMut};
use std::slice;

use arrayvec::ArrayVec;

/// Squares reachable by a single piece, split into quiet moves and captures
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Reach {
    /// Empty squares the piece can move to
    pub quiet: Bitboard,
    /// Squares with an opposing piece the piece can capture
    pub capture: Bitboard,
}

impl Reach {
    pub const EMPTY: Reach = Reach {
        quiet: Bitboard::EMPTY,
        capture: Bitboard::EMPTY,
    };

    /// Returns all the reachable squares
    #[inline]
    pub fn all(&self) -> Bitboard {
        self.quiet | self.capture
    }

    /// Returns the kind of move which ends on `dst`, or `None` if `dst` is not reachable
    #[inline]
    pub fn kind_of(&self, dst: Coord) -> Option<MoveKind> {
        if self.quiet.has(dst) {
            Some(MoveKind::Quiet)
        } else if self.capture.has(dst) {
            Some(MoveKind::Capture)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.all().is_empty()
    }
}

struct ReachBuilder<'a> {
    board: &'a Board,
    src: Coord,
    me: Probe,
    reach: Reach,
}

impl<'a> ReachBuilder<'a> {
    fn new(board: &'a Board, src: Coord) -> Self {
        ReachBuilder {
            board,
            src,
            me: Probe::from_cell(board.get(src)),
            reach: Reach::EMPTY,
        }
    }

    fn probe(&self, delta_row: isize, delta_col: isize) -> Probe {
        self.board.probe(
            self.src.row() as isize + delta_row,
            self.src.col() as isize + delta_col,
        )
    }

    fn target(&self, delta_row: isize, delta_col: isize) -> Coord {
        Coord::new(
            (self.src.row() as isize + delta_row) as usize,
            (self.src.col() as isize + delta_col) as usize,
        )
    }

    /// Adds a single step: quiet if empty, capture if opposing, skipped otherwise
    fn step(&mut self, delta_row: isize, delta_col: isize) {
        let probe = self.probe(delta_row, delta_col);
        if probe.is_empty() {
            self.reach.quiet.set(self.target(delta_row, delta_col));
        } else if probe.is_opposing(self.me) {
            self.reach.capture.set(self.target(delta_row, delta_col));
        }
    }

    /// Walks outwards until the first non-empty square, which ends the ray
    fn ray(&mut self, delta_row: isize, delta_col: isize) {
        for dist in 1..8 {
            let (dr, dc) = (delta_row * dist, delta_col * dist);
            let probe = self.probe(dr, dc);
            if probe.is_empty() {
                self.reach.quiet.set(self.target(dr, dc));
                continue;
            }
            if probe.is_opposing(self.me) {
                self.reach.capture.set(self.target(dr, dc));
            }
            break;
        }
    }

    fn pawn(&mut self) {
        let (fr, fc) = geometry::PAWN_FORWARD;
        if self.probe(fr, fc).is_empty() {
            self.reach.quiet.set(self.target(fr, fc));
            if self.src.row() == geometry::PAWN_START_ROW && self.probe(2 * fr, 2 * fc).is_empty() {
                self.reach.quiet.set(self.target(2 * fr, 2 * fc));
            }
        }
        for (dr, dc) in geometry::PAWN_CAPTURES {
            if self.probe(dr, dc).is_opposing(self.me) {
                self.reach.capture.set(self.target(dr, dc));
            }
        }
    }

    fn build(mut self) -> Reach {
        let piece = match self.me {
            Probe::Occupied(cell) => cell.piece(),
            _ => None,
        };
        match piece {
            Some(Piece::Pawn) => self.pawn(),
            Some(Piece::King) => {
                for (dr, dc) in geometry::KING_OFFSETS {
                    self.step(dr, dc);
                }
            }
            Some(Piece::Knight) => {
                for (dr, dc) in geometry::KNIGHT_OFFSETS {
                    self.step(dr, dc);
                }
            }
            Some(Piece::Rook) => {
                for (dr, dc) in geometry::LINE_RAYS {
                    self.ray(dr, dc);
                }
            }
            Some(Piece::Bishop) => {
                for (dr, dc) in geometry::DIAG_RAYS {
                    self.ray(dr, dc);
                }
            }
            Some(Piece::Queen) => {
                for (dr, dc) in geometry::LINE_RAYS.into_iter().chain(geometry::DIAG_RAYS) {
                    self.ray(dr, dc);
                }
            }
            None => {}
        }
        self.reach
    }
}

/// Computes the squares reachable by the piece standing on `src`
///
/// Pawns always move towards row 0 and may double-step from row 6, as the local grid
/// is oriented so that the player's own back rank is row 7. An empty `src` yields an
/// empty result.
pub fn reach(b: &Board, src: Coord) -> Reach {
    ReachBuilder::new(b, src).build()
}

/// Bounded list of moves
///
/// At most 16 pieces of one color can stand on the board and no piece reaches more than 27
/// squares, so the capacity is always enough.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct MoveList(ArrayVec<Move, 432>);

impl Deref for MoveList {
    type Target = ArrayVec<Move, 432>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl MoveList {
    pub fn new() -> MoveList {
        MoveList(ArrayVec::new())
    }
}

/// Generates all pseudo-legal moves of the pieces of color `c`
///
/// Positions decoded from arbitrary notation may carry more pieces than a real game does;
/// moves beyond the list capacity are dropped.
pub fn gen_moves(b: &Board, c: Color) -> MoveList {
    let mut res = MoveList::new();
    for (src, cell) in b.pieces() {
        if cell.color() != Some(c) {
            continue;
        }
        let r = reach(b, src);
        for dst in r.all() {
            if res.try_push(Move::new(src, dst)).is_err() {
                return res;
            }
        }
    }
    res
}
