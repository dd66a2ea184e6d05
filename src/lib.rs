//! Chess position and move manipulation library: bitboards, legal move
//! generation, Zobrist hashing and the SAN/FAN and FEN codecs.
//!
//! [`chess::position::Position`] is the entry point: it owns a board's
//! piece placement, side to move, castling rights, en-passant state and
//! move history, and exposes [`chess::position::Position::do_move`]/
//! [`chess::position::Position::undo_move`] together with
//! [`chess::position::Position::legal_moves`] for generating and applying
//! moves. [`chess::san`] converts between moves and Standard Algebraic
//! Notation.

pub mod chess;
mod error;

pub use chess::core::{Piece, PieceType, Side, Square};
pub use chess::moves::Move;
pub use chess::position::Position;
pub use error::{Error, Result};
