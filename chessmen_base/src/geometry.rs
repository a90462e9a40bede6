//! Movement geometry in grid coordinates
//!
//! Deltas are `(row, col)` pairs. Every local grid is oriented so that the player sitting
//! at it has the back rank on row 7, hence pawns always walk towards row 0.

pub const PAWN_START_ROW: usize = 6;

pub const PAWN_FORWARD: (isize, isize) = (-1, 0);

pub const PAWN_CAPTURES: [(isize, isize); 2] = [(-1, -1), (-1, 1)];

pub const KING_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub const LINE_RAYS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

pub const DIAG_RAYS: [(isize, isize); 4] = [(1, 1), (-1, 1), (-1, -1), (1, -1)];
