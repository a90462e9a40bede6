//! # Chessmen
//!
//! Core of a two-player networked chess board: the position codec, pseudo-legal move
//! generation, click-driven selection and the polling loop that keeps the local board in
//! sync with a remote match authority.
//!
//! The local board is always oriented so that the player's own pieces start at the bottom
//! (rows 6 and 7). For the black player, the notation is flipped at the codec boundary,
//! see [`Orientation`].
//!
//! # Example
//!
//! ```
//! use chessmen::{movegen, Board, Coord};
//!
//! let b = Board::initial();
//! let reach = movegen::reach(&b, Coord::new(6, 4));
//! assert_eq!(reach.quiet.len(), 2);
//! assert!(reach.capture.is_empty());
//! ```

pub mod board;
pub mod config;
pub mod movegen;
pub mod moves;
pub mod orient;
pub mod peer;
pub mod protocol;
pub mod select;
pub mod server;
pub mod session;
pub mod sync;

pub use chessmen_base::{bitboard, geometry, types};

pub use bitboard::Bitboard;
pub use board::{Board, MalformedNotation};
pub use config::{ConfigError, SyncConfig};
pub use movegen::{MoveList, Reach};
pub use moves::{Move, MoveError, MoveKind};
pub use orient::Orientation;
pub use peer::{Peer, PeerError, TcpPeer};
pub use protocol::{ProtocolError, Request, Status};
pub use select::{ClickOutcome, Selection};
pub use server::{LocalPeer, MatchServer};
pub use session::{Session, SessionError};
pub use types::{Cell, Color, Coord, File, Piece, Probe, Rank};
