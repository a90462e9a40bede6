//! Square selection driven by clicks

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::movegen::{self, Reach};
use crate::moves::Move;
use crate::types::{Color, Coord};

/// Selection state
///
/// Holds either nothing or the selected square together with the squares its piece
/// can reach.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    Idle,
    Selected { src: Coord, reach: Reach },
}

/// Result of a single click
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClickOutcome {
    /// Nothing changed
    Ignored,
    /// A piece was selected while nothing was selected before
    Selected(Coord),
    /// Another own piece was selected instead of the previous one
    Reselected(Coord),
    /// The selection was cleared
    Deselected,
    /// The click completed a move, which the caller must apply
    Moved(Move),
}

impl Selection {
    /// Returns the selected square, if any
    #[inline]
    pub fn src(&self) -> Option<Coord> {
        match self {
            Selection::Idle => None,
            Selection::Selected { src, .. } => Some(*src),
        }
    }

    /// Returns the reachable squares of the selected piece
    ///
    /// When nothing is selected, both sets are empty.
    #[inline]
    pub fn reach(&self) -> Reach {
        match self {
            Selection::Idle => Reach::EMPTY,
            Selection::Selected { reach, .. } => *reach,
        }
    }

    #[inline]
    pub fn quiet(&self) -> Bitboard {
        self.reach().quiet
    }

    #[inline]
    pub fn capture(&self) -> Bitboard {
        self.reach().capture
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }

    /// Clears the selection
    #[inline]
    pub fn clear(&mut self) {
        *self = Selection::Idle;
    }

    /// Handles a click on `target` by the player of color `role`
    ///
    /// `None` stands for a click outside the board, which is ignored. The board itself
    /// is not modified: on [`ClickOutcome::Moved`] the caller applies the move.
    pub fn click(&mut self, b: &Board, role: Color, target: Option<Coord>) -> ClickOutcome {
        let target = match target {
            Some(t) => t,
            None => return ClickOutcome::Ignored,
        };
        let own = b.color_of(target) == Some(role);
        match *self {
            Selection::Idle => {
                if !own {
                    return ClickOutcome::Ignored;
                }
                *self = Selection::Selected {
                    src: target,
                    reach: movegen::reach(b, target),
                };
                ClickOutcome::Selected(target)
            }
            Selection::Selected { src, reach } => {
                if reach.all().has(target) {
                    *self = Selection::Idle;
                    return ClickOutcome::Moved(Move::new(src, target));
                }
                if own && target != src {
                    *self = Selection::Selected {
                        src: target,
                        reach: movegen::reach(b, target),
                    };
                    return ClickOutcome::Reselected(target);
                }
                *self = Selection::Idle;
                ClickOutcome::Deselected
            }
        }
    }
}
