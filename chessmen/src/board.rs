//! Position model and its textual notation

use crate::orient::Orientation;
use crate::types::{Cell, Color, Coord, Probe};

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

/// Notation of the standard starting position
pub const INITIAL_NOTATION: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// Error decoding the notation of a position
///
/// Rows in the variants are zero-based rank group numbers, in textual order.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum MalformedNotation {
    /// Notation is empty or blank
    #[error("board not specified")]
    NoBoard,
    /// Rank group expands to more than 8 squares
    #[error("too many items in rank group {0}")]
    RankOverflow(usize),
    /// Rank group expands to less than 8 squares
    #[error("not enough items in rank group {0}")]
    RankUnderflow(usize),
    /// More than 8 rank groups
    #[error("too many rank groups")]
    Overflow,
    /// Less than 8 rank groups
    #[error("not enough rank groups")]
    Underflow,
    /// Character is neither a digit from 1 to 8 nor a piece letter
    #[error("unexpected char {0:?}")]
    UnexpectedChar(char),
}

/// Chess position: the contents of all 64 squares
///
/// The board does not know whose turn it is and does not check anything on its own. It is
/// a plain grid which can be probed, changed by [`Board::apply_move()`] and converted to and
/// from the notation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Board {
    cells: [Cell; 64],
}

impl Board {
    /// Returns a board without any pieces
    #[inline]
    pub const fn empty() -> Board {
        Board {
            cells: [Cell::EMPTY; 64],
        }
    }

    /// Returns a board with the initial position
    pub fn initial() -> Board {
        Board::decode(INITIAL_NOTATION).expect("initial notation must decode")
    }

    /// Parses a board from the notation
    ///
    /// Only the first whitespace-separated field is considered, the rest of the text is
    /// ignored.
    pub fn decode(text: &str) -> Result<Board, MalformedNotation> {
        let field = text
            .split_whitespace()
            .next()
            .ok_or(MalformedNotation::NoBoard)?;
        Ok(Board {
            cells: parse_cells(field)?,
        })
    }

    /// Parses a board from the notation as seen by a player with orientation `o`
    pub fn decode_oriented(text: &str, o: Orientation) -> Result<Board, MalformedNotation> {
        let field = text
            .split_whitespace()
            .next()
            .ok_or(MalformedNotation::NoBoard)?;
        Board::decode(&o.apply(field))
    }

    /// Converts the board into the notation
    ///
    /// Does the same as `Board::to_string()`. It is recommended to use this function instead of
    /// `to_string()` for better readability.
    #[inline]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Converts the board into the notation for a player with orientation `o`
    pub fn encode_oriented(&self, o: Orientation) -> String {
        o.apply(&self.encode())
    }

    /// Returns the contents of the square with coordinate `c`
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.cells[c.index()]
    }

    /// Returns the contents of the square `(row, col)`, which may lie outside the board
    ///
    /// This function never fails: any coordinate out of range yields [`Probe::OffBoard`].
    #[inline]
    pub fn probe(&self, row: isize, col: isize) -> Probe {
        match Coord::try_new(row, col) {
            Some(c) => Probe::from_cell(self.get(c)),
            None => Probe::OffBoard,
        }
    }

    /// Returns the color of the piece on `c`, if any
    #[inline]
    pub fn color_of(&self, c: Coord) -> Option<Color> {
        self.get(c).color()
    }

    /// Puts `cell` to the square with coordinate `c`
    #[inline]
    pub fn put(&mut self, c: Coord, cell: Cell) {
        self.cells[c.index()] = cell;
    }

    /// Moves whatever stands on `src` to `dst` and clears `src`
    ///
    /// The previous contents of `dst` are overwritten, which is how captures happen, and
    /// returned. No legality check is performed here.
    pub fn apply_move(&mut self, src: Coord, dst: Coord) -> Cell {
        let moved = self.get(src);
        let captured = self.get(dst);
        self.put(dst, moved);
        self.put(src, Cell::EMPTY);
        captured
    }

    /// Returns an iterator over all occupied squares with their contents
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        Coord::iter()
            .map(|c| (c, self.get(c)))
            .filter(|(_, cell)| cell.is_occupied())
    }

    /// Wraps the board to allow pretty-printing it as seen by a player with orientation `o`
    ///
    /// The resulting wrapper implements [`fmt::Display`], so can be used with
    /// `write!()`, `println!()`, or `ToString::to_string`.
    ///
    /// # Example
    ///
    /// ```
    /// # use chessmen::{Board, Orientation, board::PrettyStyle};
    /// #
    /// let b = Board::initial();
    ///
    /// let res = r#"
    /// 8|rnbqkbnr
    /// 7|pppppppp
    /// 6|........
    /// 5|........
    /// 4|........
    /// 3|........
    /// 2|PPPPPPPP
    /// 1|RNBQKBNR
    /// -+--------
    ///  |abcdefgh
    /// "#;
    /// assert_eq!(
    ///     b.pretty(PrettyStyle::Ascii, Orientation::Normal).to_string().trim_matches('\n'),
    ///     res.trim_matches('\n'),
    /// );
    /// ```
    #[inline]
    pub fn pretty(&self, style: PrettyStyle, orientation: Orientation) -> Pretty<'_> {
        Pretty {
            board: self,
            style,
            orientation,
        }
    }
}

impl Default for Board {
    #[inline]
    fn default() -> Board {
        Board::empty()
    }
}

fn parse_cells(s: &str) -> Result<[Cell; 64], MalformedNotation> {
    type Error = MalformedNotation;

    let mut col = 0_usize;
    let mut row = 0_usize;
    let mut cells = [Cell::EMPTY; 64];
    for b in s.bytes() {
        match b {
            b'1'..=b'8' => {
                let add = (b - b'0') as usize;
                if col + add > 8 {
                    return Err(Error::RankOverflow(row));
                }
                col += add;
            }
            b'/' => {
                if col < 8 {
                    return Err(Error::RankUnderflow(row));
                }
                row += 1;
                col = 0;
                if row >= 8 {
                    return Err(Error::Overflow);
                }
            }
            _ => {
                let cell = Cell::from_char(b as char).ok_or(Error::UnexpectedChar(b as char))?;
                if col >= 8 {
                    return Err(Error::RankOverflow(row));
                }
                cells[Coord::new(row, col).index()] = cell;
                col += 1;
            }
        };
    }

    if col < 8 {
        return Err(Error::RankUnderflow(row));
    }
    if row < 7 {
        return Err(Error::Underflow);
    }

    Ok(cells)
}

impl FromStr for Board {
    type Err = MalformedNotation;

    fn from_str(s: &str) -> Result<Board, Self::Err> {
        Board::decode(s)
    }
}

fn format_cells(cells: &[Cell; 64], f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    for row in 0..8 {
        if row != 0 {
            write!(f, "/")?;
        }
        let mut empty = 0;
        for col in 0..8 {
            let cell = cells[Coord::new(row, col).index()];
            if cell.is_free() {
                empty += 1;
                continue;
            }
            if empty != 0 {
                write!(f, "{}", (b'0' + empty) as char)?;
                empty = 0;
            }
            write!(f, "{}", cell)?;
        }
        if empty != 0 {
            write!(f, "{}", (b'0' + empty) as char)?;
        }
    }
    Ok(())
}

impl Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        format_cells(&self.cells, f)
    }
}

/// Style for [`Board::pretty()`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrettyStyle {
    /// Print pieces and frames as ASCII characters
    Ascii,
    /// Print pieces and frames as fancy Unicode characters
    Utf8,
}

/// Wrapper to pretty-print the board
///
/// See docs for [`Board::pretty()`] for more details.
pub struct Pretty<'a> {
    board: &'a Board,
    style: PrettyStyle,
    orientation: Orientation,
}

trait StyleTable {
    const HORZ_FRAME: char;
    const VERT_FRAME: char;
    const ANGLE_FRAME: char;

    fn cell(c: Cell) -> char;

    fn fmt(b: &Board, o: Orientation, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for row in 0..8 {
            let (_, rank) = o.label_parts(Coord::new(row, 0));
            write!(f, "{}{}", rank, Self::VERT_FRAME)?;
            for col in 0..8 {
                write!(f, "{}", Self::cell(b.get(Coord::new(row, col))))?;
            }
            writeln!(f)?;
        }
        write!(f, "{}{}", Self::HORZ_FRAME, Self::ANGLE_FRAME)?;
        for _ in 0..8 {
            write!(f, "{}", Self::HORZ_FRAME)?;
        }
        writeln!(f)?;
        write!(f, " {}", Self::VERT_FRAME)?;
        for col in 0..8 {
            let (file, _) = o.label_parts(Coord::new(7, col));
            write!(f, "{}", file)?;
        }
        writeln!(f)?;
        Ok(())
    }
}

struct AsciiStyleTable;
struct Utf8StyleTable;

impl StyleTable for AsciiStyleTable {
    const HORZ_FRAME: char = '-';
    const VERT_FRAME: char = '|';
    const ANGLE_FRAME: char = '+';

    fn cell(c: Cell) -> char {
        c.as_char()
    }
}

impl StyleTable for Utf8StyleTable {
    const HORZ_FRAME: char = '─';
    const VERT_FRAME: char = '│';
    const ANGLE_FRAME: char = '┼';

    fn cell(c: Cell) -> char {
        c.as_utf8_char()
    }
}

impl<'a> Display for Pretty<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.style {
            PrettyStyle::Ascii => AsciiStyleTable::fmt(self.board, self.orientation, f),
            PrettyStyle::Utf8 => Utf8StyleTable::fmt(self.board, self.orientation, f),
        }
    }
}
