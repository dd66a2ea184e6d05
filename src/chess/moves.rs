//! Moves, their undo snapshots, and the small value types that travel with
//! them: [`Move`], [`UndoEntry`], [`MoveList`], [`CastleRights`] and
//! [`GameContext`] (the castling-path data [`super::position::Position`]
//! consults instead of recomputing it on every castle attempt).

use std::fmt;

use arrayvec::ArrayVec;
use bitflags::bitflags;

use super::bitboard::Bitboard;
use super::core::{Piece, PieceType, Side, Square};
use super::zobrist::Key;
use crate::Error;

bitflags! {
    /// Castling rights held by one side. Indexing this directly as `bits()`
    /// (`0..=3`) is also how [`super::zobrist::castle_right_key`] turns a
    /// side's rights into a Zobrist table index.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CastleRights: u8 {
        /// Permission to castle king-side.
        const KING_SIDE = 0b01;
        /// Permission to castle queen-side.
        const QUEEN_SIDE = 0b10;
    }
}

/// At most this many legal moves exist in any reachable chess position (the
/// record is 218); [`MoveList`] is a fixed-capacity, stack-allocated vector
/// sized to that bound so move generation never allocates.
pub const MAX_MOVES: usize = 218;

/// A move: where a piece starts, where it ends, and what it promotes to (if
/// anything). Equality is purely structural — two moves are equal iff all
/// three fields match.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Piece,
}

impl Move {
    /// The distinguished "no move" value, used by [`super::position::Position::do_null_move`].
    pub const NULL: Self = Self {
        from: Square::NONE,
        to: Square::NONE,
        promotion: Piece::None,
    };

    #[must_use]
    pub const fn new(from: Square, to: Square, promotion: Piece) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    #[must_use]
    pub const fn is_null(self) -> bool {
        self.from.is_none() && self.to.is_none() && self.promotion.is_none()
    }

    #[must_use]
    pub const fn is_promotion(self) -> bool {
        !self.promotion.is_none()
    }

    /// Parses a long algebraic coordinate move: `<file><rank><file><rank>`
    /// plus an optional promotion letter whose case encodes the promoting
    /// side (uppercase white, lowercase black), e.g. `e7e8Q` or `e7e8q`.
    pub fn from_uci(value: &str) -> Result<Self, Error> {
        if value.eq_ignore_ascii_case("0000") {
            return Ok(Self::NULL);
        }
        let bytes = value.as_bytes();
        if !(4..=5).contains(&bytes.len()) {
            return Err(Error::parse(
                "expected a 4 or 5 character long algebraic move",
                value,
            ));
        }
        let from = Square::try_from(&value[0..2])?;
        let to = Square::try_from(&value[2..4])?;
        let promotion = match bytes.get(4) {
            None => Piece::None,
            Some(&letter) => {
                let side = if letter.is_ascii_uppercase() {
                    Side::White
                } else {
                    Side::Black
                };
                let kind = match letter.to_ascii_uppercase() {
                    b'Q' => PieceType::Queen,
                    b'R' => PieceType::Rook,
                    b'B' => PieceType::Bishop,
                    b'N' => PieceType::Knight,
                    _ => {
                        return Err(Error::parse(
                            "unknown promotion letter: expected one of \"qrbnQRBN\"",
                            value,
                        ))
                    },
                };
                Piece::make(side, kind)
            },
        };
        Ok(Self::new(from, to, promotion))
    }

    /// Renders as a long algebraic coordinate move.
    #[must_use]
    pub fn to_uci(self) -> String {
        if self.is_null() {
            return "0000".to_string();
        }
        let mut uci = format!("{}{}", self.from, self.to);
        if !self.promotion.is_none() {
            uci.push(self.promotion.fen_char());
        }
        uci
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A fixed-capacity, stack-allocated list of moves.
pub type MoveList = ArrayVec<Move, MAX_MOVES>;

/// Snapshot sufficient to reverse one [`super::position::Position::do_move`]
/// call. The full-move counter and side-to-move are not stored: they are
/// recoverable from the move itself and the position's prior state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UndoEntry {
    pub mv: Move,
    /// The captured piece, or [`Piece::None`] if the move captured nothing.
    pub captured: Piece,
    /// Square the captured piece actually stood on; differs from `mv.to`
    /// only for en-passant captures.
    pub captured_square: Square,
    /// Castling rights for both sides before the move, indexed by
    /// [`super::core::Side::index`].
    pub prior_castle_rights: [CastleRights; 2],
    pub prior_ep_destination: Square,
    pub prior_ep_target: Square,
    pub prior_half_move_counter: u32,
    pub prior_hash: Key,
}

/// One side's squares/paths for a single castle (king-side or queen-side).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CastlingPath {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
    /// Squares (other than `king_from`/`rook_from`) that must be empty.
    pub empty_squares: Bitboard,
    /// Squares the king must not be attacked on while castling, including
    /// `king_from` and `king_to`.
    pub safe_squares: Bitboard,
}

/// Castling-path data for both sides and both castles. Orthodox chess's
/// values are available via [`GameContext::default`]; variants with
/// different board geometry (e.g. Chess960) would supply their own.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameContext {
    pub king_side: [CastlingPath; 2],
    pub queen_side: [CastlingPath; 2],
}

impl Default for GameContext {
    fn default() -> Self {
        let white_king_side = CastlingPath {
            king_from: Square::E1,
            king_to: Square::G1,
            rook_from: Square::H1,
            rook_to: Square::F1,
            empty_squares: Bitboard::EMPTY.with(Square::F1).with(Square::G1),
            safe_squares: Bitboard::EMPTY
                .with(Square::E1)
                .with(Square::F1)
                .with(Square::G1),
        };
        let white_queen_side = CastlingPath {
            king_from: Square::E1,
            king_to: Square::C1,
            rook_from: Square::A1,
            rook_to: Square::D1,
            empty_squares: Bitboard::EMPTY
                .with(Square::B1)
                .with(Square::C1)
                .with(Square::D1),
            safe_squares: Bitboard::EMPTY
                .with(Square::E1)
                .with(Square::D1)
                .with(Square::C1),
        };
        let black_king_side = CastlingPath {
            king_from: Square::E8,
            king_to: Square::G8,
            rook_from: Square::H8,
            rook_to: Square::F8,
            empty_squares: Bitboard::EMPTY.with(Square::F8).with(Square::G8),
            safe_squares: Bitboard::EMPTY
                .with(Square::E8)
                .with(Square::F8)
                .with(Square::G8),
        };
        let black_queen_side = CastlingPath {
            king_from: Square::E8,
            king_to: Square::C8,
            rook_from: Square::A8,
            rook_to: Square::D8,
            empty_squares: Bitboard::EMPTY
                .with(Square::B8)
                .with(Square::C8)
                .with(Square::D8),
            safe_squares: Bitboard::EMPTY
                .with(Square::E8)
                .with(Square::D8)
                .with(Square::C8),
        };
        Self {
            king_side: [white_king_side, black_king_side],
            queen_side: [white_queen_side, black_queen_side],
        }
    }
}
