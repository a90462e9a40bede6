use std::fmt;
use std::hint;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordParseError {
    #[error("unexpected file char {0:?}")]
    UnexpectedFileChar(char),
    #[error("unexpected rank char {0:?}")]
    UnexpectedRankChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CellParseError {
    #[error("unexpected cell char {0:?}")]
    UnexpectedChar(char),
    #[error("invalid string length")]
    BadLength,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("unexpected color {0:?}")]
    UnexpectedColor(String),
}

/// User-facing file label (`a` to `h`)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl File {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => File::A,
            1 => File::B,
            2 => File::C,
            3 => File::D,
            4 => File::E,
            5 => File::F,
            6 => File::G,
            7 => File::H,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "file index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Some(Self::from_index((u32::from(c) - u32::from('a')) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'a' + *self as u8) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// User-facing rank label (`1` to `8`)
///
/// Ranks are indexed from `R1 = 0` upwards. How a rank maps onto a grid row depends on
/// the orientation of the player looking at the board.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[repr(u8)]
pub enum Rank {
    R1 = 0,
    R2 = 1,
    R3 = 2,
    R4 = 3,
    R5 = 4,
    R6 = 5,
    R7 = 6,
    R8 = 7,
}

impl Rank {
    pub const fn index(&self) -> usize {
        *self as u8 as usize
    }

    pub const unsafe fn from_index_unchecked(val: usize) -> Self {
        match val {
            0 => Rank::R1,
            1 => Rank::R2,
            2 => Rank::R3,
            3 => Rank::R4,
            4 => Rank::R5,
            5 => Rank::R6,
            6 => Rank::R7,
            7 => Rank::R8,
            _ => hint::unreachable_unchecked(),
        }
    }

    pub const fn from_index(val: usize) -> Self {
        assert!(val < 8, "rank index must be between 0 and 7");
        unsafe { Self::from_index_unchecked(val) }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..8).map(|x| unsafe { Self::from_index_unchecked(x) })
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1'..='8' => Some(Self::from_index((u32::from(c) - u32::from('1')) as usize)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        (b'1' + *self as u8) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

/// Square on the grid, addressed by `(row, col)`
///
/// Row 0 is the first rank group of the notation, column 0 is the first square inside
/// a rank group. Coordinates never depend on orientation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord(u8);

impl Coord {
    pub const fn new(row: usize, col: usize) -> Coord {
        assert!(row < 8 && col < 8, "row and column must be between 0 and 7");
        Coord(((row as u8) << 3) | col as u8)
    }

    /// Returns the coordinate if both `row` and `col` are inside the board
    pub const fn try_new(row: isize, col: isize) -> Option<Coord> {
        if row < 0 || row >= 8 || col < 0 || col >= 8 {
            return None;
        }
        Some(Coord::new(row as usize, col as usize))
    }

    pub const fn from_index(val: usize) -> Coord {
        assert!(val < 64, "coord must be between 0 and 63");
        Coord(val as u8)
    }

    pub const fn row(&self) -> usize {
        (self.0 >> 3) as usize
    }

    pub const fn col(&self) -> usize {
        (self.0 & 7) as usize
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Rotates the coordinate by 180 degrees
    ///
    /// This is exactly what reversing the notation text does to the squares.
    pub const fn rotated(self) -> Coord {
        Coord(63 - self.0)
    }

    pub fn try_shift(self, delta_row: isize, delta_col: isize) -> Option<Coord> {
        Coord::try_new(
            self.row() as isize + delta_row,
            self.col() as isize + delta_col,
        )
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0_u8..64_u8).map(Coord)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.0 < 64 {
            return write!(f, "Coord({}, {})", self.row(), self.col());
        }
        write!(f, "Coord(?{:?})", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const fn inv(&self) -> Color {
        match *self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_char(&self) -> char {
        match *self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn from_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// Returns the role word used on the wire
    pub fn as_str(&self) -> &'static str {
        match *self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(ColorParseError::UnexpectedColor(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Pawn = 0,
    Rook = 1,
    Knight = 2,
    Bishop = 3,
    Queen = 4,
    King = 5,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Rook,
        Piece::Knight,
        Piece::Bishop,
        Piece::Queen,
        Piece::King,
    ];
}

/// Contents of a square: either empty, or a piece of some color
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Cell(u8);

impl Cell {
    pub const EMPTY: Cell = Cell(0);
    pub const COUNT: usize = 13;

    pub const fn is_free(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_occupied(&self) -> bool {
        self.0 != 0
    }

    pub const fn from_index(val: usize) -> Cell {
        assert!(val < Self::COUNT, "index too large");
        Cell(val as u8)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn from_parts(c: Color, p: Piece) -> Cell {
        Cell(match c {
            Color::White => 1 + p as u8,
            Color::Black => 7 + p as u8,
        })
    }

    pub const fn color(&self) -> Option<Color> {
        match self.0 {
            0 => None,
            1..=6 => Some(Color::White),
            _ => Some(Color::Black),
        }
    }

    pub const fn piece(&self) -> Option<Piece> {
        match self.0 {
            0 => None,
            1 | 7 => Some(Piece::Pawn),
            2 | 8 => Some(Piece::Rook),
            3 | 9 => Some(Piece::Knight),
            4 | 10 => Some(Piece::Bishop),
            5 | 11 => Some(Piece::Queen),
            _ => Some(Piece::King),
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).map(Cell::from_index)
    }

    pub fn as_char(&self) -> char {
        b".PRNBQKprnbqk"[self.0 as usize] as char
    }

    pub fn as_utf8_char(&self) -> char {
        [
            '.', '♙', '♖', '♘', '♗', '♕', '♔', '♟', '♜', '♞', '♝', '♛', '♚',
        ][self.0 as usize]
    }

    /// Parses a piece letter
    ///
    /// Only the twelve piece letters are accepted. Empty squares have no letter of
    /// their own in the notation, so `.` is only understood by [`Cell::from_str`].
    pub fn from_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'r' => Piece::Rook,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some(Cell::from_parts(color, piece))
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if (self.0 as usize) < Self::COUNT {
            return write!(f, "Cell({})", self.as_char());
        }
        write!(f, "Cell(?{:?})", self.0)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 1 {
            return Err(CellParseError::BadLength);
        }
        let ch = s.as_bytes()[0] as char;
        if ch == '.' {
            return Ok(Cell::EMPTY);
        }
        Cell::from_char(ch).ok_or(CellParseError::UnexpectedChar(ch))
    }
}

/// Result of looking at a possibly out-of-range square
///
/// Move generation probes neighbors near the edges without bounds checks, so it needs
/// to tell "outside the board" apart from "empty square" and from a real piece.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Probe {
    OffBoard,
    Empty,
    Occupied(Cell),
}

impl Probe {
    pub const fn from_cell(cell: Cell) -> Probe {
        if cell.is_free() {
            Probe::Empty
        } else {
            Probe::Occupied(cell)
        }
    }

    pub const fn is_empty(&self) -> bool {
        matches!(self, Probe::Empty)
    }

    /// Returns `None` for both empty and off-board squares
    pub const fn color(&self) -> Option<Color> {
        match self {
            Probe::Occupied(cell) => cell.color(),
            _ => None,
        }
    }

    /// Returns `true` iff both probes hold real pieces of different colors
    pub fn is_opposing(&self, other: Probe) -> bool {
        match (self.color(), other.color()) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file() {
        for (idx, file) in File::iter().enumerate() {
            assert_eq!(file.index(), idx);
            assert_eq!(File::from_index(idx), file);
            assert_eq!(File::from_char(file.as_char()), Some(file));
        }
        assert_eq!(File::from_char('i'), None);
    }

    #[test]
    fn test_rank() {
        for (idx, rank) in Rank::iter().enumerate() {
            assert_eq!(rank.index(), idx);
            assert_eq!(Rank::from_index(idx), rank);
            assert_eq!(Rank::from_char(rank.as_char()), Some(rank));
        }
        assert_eq!(Rank::R1.as_char(), '1');
        assert_eq!(Rank::from_char('9'), None);
    }

    #[test]
    fn test_coord() {
        let mut coords = Vec::new();
        for row in 0..8 {
            for col in 0..8 {
                let coord = Coord::new(row, col);
                assert_eq!(coord.row(), row);
                assert_eq!(coord.col(), col);
                coords.push(coord);
            }
        }
        assert_eq!(coords, Coord::iter().collect::<Vec<_>>());
        assert_eq!(Coord::new(6, 4).rotated(), Coord::new(1, 3));
        assert_eq!(Coord::new(0, 0).try_shift(-1, 0), None);
        assert_eq!(Coord::new(0, 0).try_shift(1, 2), Some(Coord::new(1, 2)));
        assert_eq!(Coord::try_new(7, 8), None);
    }

    #[test]
    fn test_cell() {
        assert_eq!(Cell::EMPTY.color(), None);
        assert_eq!(Cell::EMPTY.piece(), None);
        let mut cells = vec![Cell::EMPTY];
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                let cell = Cell::from_parts(color, piece);
                assert_eq!(cell.color(), Some(color));
                assert_eq!(cell.piece(), Some(piece));
                cells.push(cell);
            }
        }
        assert_eq!(cells, Cell::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_cell_str() {
        for cell in Cell::iter() {
            let s = cell.to_string();
            assert_eq!(Cell::from_str(&s), Ok(cell));
        }
        assert_eq!(Cell::from_char('.'), None);
        assert_eq!(Cell::from_char('x'), None);
        assert_eq!(
            Cell::from_char('N'),
            Some(Cell::from_parts(Color::White, Piece::Knight))
        );
    }

    #[test]
    fn test_color_str() {
        assert_eq!(Color::from_str("white"), Ok(Color::White));
        assert_eq!(Color::from_str("black"), Ok(Color::Black));
        assert!(Color::from_str("red").is_err());
        assert_eq!(Color::White.to_string(), "white");
        assert_eq!(Color::Black.inv(), Color::White);
    }

    #[test]
    fn test_probe() {
        let white_rook = Probe::from_cell(Cell::from_parts(Color::White, Piece::Rook));
        let black_pawn = Probe::from_cell(Cell::from_parts(Color::Black, Piece::Pawn));
        assert_eq!(Probe::from_cell(Cell::EMPTY), Probe::Empty);
        assert!(white_rook.is_opposing(black_pawn));
        assert!(black_pawn.is_opposing(white_rook));
        assert!(!white_rook.is_opposing(white_rook));
        assert!(!white_rook.is_opposing(Probe::Empty));
        assert!(!white_rook.is_opposing(Probe::OffBoard));
        assert_eq!(Probe::OffBoard.color(), None);
        assert_eq!(Probe::Empty.color(), None);
        assert!(!Probe::OffBoard.is_empty());
    }
}
