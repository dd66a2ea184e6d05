//! Chess position and move manipulation: board primitives, bitboards,
//! attack generation, Zobrist hashing, moves, the position itself, move
//! generation and the SAN/FAN codec.

pub mod attacks;
pub mod bitboard;
pub mod core;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod san;
pub mod tables;
pub mod zobrist;
