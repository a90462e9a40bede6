//! # Base types for chessmen
//!
//! This is an auxiliary crate for `chessmen`, which contains the plain value types: squares,
//! pieces, cells and square sets. Everything here is free of I/O.
//!
//! Normally you don't want to use this crate directly. Use `chessmen` instead.

pub mod bitboard;
pub mod geometry;
pub mod types;

pub use bitboard::Bitboard;
pub use types::{Cell, Color, Coord, File, Piece, Probe, Rank};
