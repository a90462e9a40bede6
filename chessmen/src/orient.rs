//! Board orientation and user-facing square labels

use crate::types::{Color, Coord, CoordParseError, File, Rank};

/// How the local grid relates to the authoritative (white-side) notation
///
/// The orientation is fixed once a color is assigned: white plays on a normal board, black
/// on a flipped one. Flipping reverses the notation text, so the local grid always has the
/// player's own back rank on row 7.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Normal,
    Flipped,
}

impl Orientation {
    /// Returns the orientation used by the player of color `role`
    #[inline]
    pub const fn for_role(role: Color) -> Orientation {
        match role {
            Color::White => Orientation::Normal,
            Color::Black => Orientation::Flipped,
        }
    }

    #[inline]
    pub const fn is_flipped(&self) -> bool {
        matches!(self, Orientation::Flipped)
    }

    /// Converts notation text between the authoritative and the local orientation
    ///
    /// When flipped, the text is reversed character by character, which reverses both the
    /// order of rank groups and the order inside each group. The conversion is its own
    /// inverse, so it serves both before decoding and after encoding.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Orientation::Normal => text.to_string(),
            Orientation::Flipped => text.chars().rev().collect(),
        }
    }

    /// Returns the file and rank labels the player sees for `coord`
    pub fn label_parts(&self, coord: Coord) -> (File, Rank) {
        match self {
            Orientation::Normal => (
                File::from_index(coord.col()),
                Rank::from_index(7 - coord.row()),
            ),
            Orientation::Flipped => (
                File::from_index(7 - coord.col()),
                Rank::from_index(coord.row()),
            ),
        }
    }

    /// Returns the grid coordinate labelled with `file` and `rank`
    pub fn coord_of(&self, file: File, rank: Rank) -> Coord {
        match self {
            Orientation::Normal => Coord::new(7 - rank.index(), file.index()),
            Orientation::Flipped => Coord::new(rank.index(), 7 - file.index()),
        }
    }

    /// Formats `coord` as a label like `e2`
    pub fn label(&self, coord: Coord) -> String {
        let (file, rank) = self.label_parts(coord);
        format!("{}{}", file, rank)
    }

    /// Parses a label like `e2` into a grid coordinate
    pub fn parse_label(&self, s: &str) -> Result<Coord, CoordParseError> {
        if s.len() != 2 {
            return Err(CoordParseError::BadLength);
        }
        let bytes = s.as_bytes();
        let (file_ch, rank_ch) = (bytes[0] as char, bytes[1] as char);
        let file = File::from_char(file_ch).ok_or(CoordParseError::UnexpectedFileChar(file_ch))?;
        let rank = Rank::from_char(rank_ch).ok_or(CoordParseError::UnexpectedRankChar(rank_ch))?;
        Ok(self.coord_of(file, rank))
    }
}
