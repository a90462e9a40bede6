//! Moves and their validation

use crate::board::Board;
use crate::movegen;
use crate::orient::Orientation;
use crate::types::{Color, Coord, CoordParseError};

use std::fmt;

use thiserror::Error;

/// Move kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Move to an empty square
    Quiet,
    /// Move onto a square with an opposing piece
    Capture,
}

/// Error validating a move for the player of a given color
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MoveError {
    /// Source square is empty
    #[error("no piece selected")]
    NoPiece,
    /// Source square holds a piece of the other color
    #[error("opposite piece selected")]
    OpponentPiece,
    /// Destination square cannot be reached by the piece
    #[error("invalid move")]
    Unreachable,
}

/// Error parsing a move written with square labels, like `e2e4`
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MoveParseError {
    /// Bad string length
    #[error("bad string length")]
    BadLength,
    /// Bad source square
    #[error("bad source: {0}")]
    BadSrc(CoordParseError),
    /// Bad destination square
    #[error("bad destination: {0}")]
    BadDst(CoordParseError),
}

/// Move of a single piece from `src` to `dst`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub src: Coord,
    pub dst: Coord,
}

impl Move {
    #[inline]
    pub const fn new(src: Coord, dst: Coord) -> Move {
        Move { src, dst }
    }

    /// Parses a move like `e2e4`, with labels as seen by a player with orientation `o`
    ///
    /// Whitespace between the two squares is allowed, so `e2 e4` works as well.
    pub fn parse(s: &str, o: Orientation) -> Result<Move, MoveParseError> {
        let compact: String = s.split_whitespace().collect();
        if compact.len() != 4 || !compact.is_ascii() {
            return Err(MoveParseError::BadLength);
        }
        let src = o
            .parse_label(&compact[0..2])
            .map_err(MoveParseError::BadSrc)?;
        let dst = o
            .parse_label(&compact[2..4])
            .map_err(MoveParseError::BadDst)?;
        Ok(Move { src, dst })
    }

    /// Checks that the player of color `role` may make this move on `b`
    ///
    /// Returns the kind of the move on success.
    pub fn validate(&self, b: &Board, role: Color) -> Result<MoveKind, MoveError> {
        match b.color_of(self.src) {
            None => return Err(MoveError::NoPiece),
            Some(c) if c != role => return Err(MoveError::OpponentPiece),
            Some(_) => {}
        }
        movegen::reach(b, self.src)
            .kind_of(self.dst)
            .ok_or(MoveError::Unreachable)
    }

    /// Validates the move and applies it to `b`
    ///
    /// On error, the board is left unchanged.
    pub fn make(&self, b: &mut Board, role: Color) -> Result<MoveKind, MoveError> {
        let kind = self.validate(b, role)?;
        b.apply_move(self.src, self.dst);
        Ok(kind)
    }

    /// Wraps the move to print it with labels as seen by a player with orientation `o`
    #[inline]
    pub fn styled(&self, o: Orientation) -> StyledMove {
        StyledMove { mv: *self, o }
    }
}

/// Wrapper to print a move with square labels
///
/// See [`Move::styled()`] for details.
pub struct StyledMove {
    mv: Move,
    o: Orientation,
}

impl fmt::Display for StyledMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}{}", self.o.label(self.mv.src), self.o.label(self.mv.dst))
    }
}
