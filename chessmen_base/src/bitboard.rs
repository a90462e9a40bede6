use crate::types::Coord;
use derive_more::{BitAnd, BitOr, BitOrAssign};
use std::fmt;
use std::iter::FromIterator;

/// Set of squares
///
/// Bit `i` stands for the coordinate with index `i`, so iteration goes in row-major order.
#[derive(Default, Copy, Clone, PartialEq, Eq, Hash, BitAnd, BitOr, BitOrAssign)]
pub struct Bitboard(u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    #[inline]
    const fn bit(coord: Coord) -> u64 {
        1_u64 << coord.index()
    }

    /// Returns the set with `coord` added
    #[inline]
    pub const fn with(self, coord: Coord) -> Bitboard {
        Bitboard(self.0 | Self::bit(coord))
    }

    #[inline]
    pub fn set(&mut self, coord: Coord) {
        self.0 |= Self::bit(coord);
    }

    #[inline]
    pub const fn has(&self, coord: Coord) -> bool {
        self.0 & Self::bit(coord) != 0
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Coord> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Bitboard {
        iter.into_iter().fold(Bitboard::EMPTY, Bitboard::with)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Bitboard({})", self)
    }
}

/// Prints the set row by row, `1` for members, rows separated by `/`
impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for row in 0..8 {
            if row != 0 {
                write!(f, "/")?;
            }
            for col in 0..8 {
                let ch = if self.has(Coord::new(row, col)) { '1' } else { '0' };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

/// Iterator over the squares of a [`Bitboard`], lowest index first
pub struct Iter(u64);

impl Iterator for Iter {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.0 == 0 {
            return None;
        }
        let idx = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(Coord::from_index(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Iter {}

impl IntoIterator for Bitboard {
    type Item = Coord;
    type IntoIter = Iter;

    fn into_iter(self) -> Iter {
        Iter(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter() {
        let bb = Bitboard::EMPTY
            .with(Coord::new(4, 0))
            .with(Coord::new(6, 4))
            .with(Coord::new(5, 5));
        assert_eq!(
            bb.into_iter().collect::<Vec<_>>(),
            vec![Coord::new(4, 0), Coord::new(5, 5), Coord::new(6, 4)],
        );
        assert_eq!(bb.into_iter().collect::<Bitboard>(), bb);
        assert_eq!(bb.into_iter().len(), 3);
    }

    #[test]
    fn test_set_ops() {
        let ca = Coord::new(4, 0);
        let cb = Coord::new(6, 4);
        let cc = Coord::new(5, 5);

        let quiet = Bitboard::EMPTY.with(ca).with(cb);
        let capture = Bitboard::EMPTY.with(cb).with(cc);
        assert_eq!(quiet & capture, Bitboard::EMPTY.with(cb));
        assert_eq!((quiet | capture).len(), 3);

        let mut all = quiet;
        all |= capture;
        assert!(all.has(ca) && all.has(cb) && all.has(cc));
        assert!(!all.has(Coord::new(0, 0)));

        let mut bb = Bitboard::EMPTY;
        assert!(bb.is_empty());
        bb.set(cc);
        assert_eq!(bb, Bitboard::EMPTY.with(cc));
    }

    #[test]
    fn test_format() {
        let bb = Bitboard::EMPTY
            .with(Coord::new(0, 7))
            .with(Coord::new(4, 0))
            .with(Coord::new(5, 5))
            .with(Coord::new(6, 4));
        assert_eq!(
            bb.to_string(),
            "00000001/00000000/00000000/00000000/10000000/00000100/00001000/00000000"
        );
    }
}
