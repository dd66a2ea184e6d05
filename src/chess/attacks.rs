//! Attack-set generation for every piece kind.
//!
//! Knight, king and pawn attacks are plain table lookups (see
//! [`super::tables`]). Sliding pieces (bishop, rook, queen) derive their
//! attacks from the current occupancy at query time using
//! [`BETWEEN`] and [`FAR_SQUARE`]: for each ray direction,
//! the full reach to the board edge is `BETWEEN[origin][edge] | edge`, and
//! if that ray crosses an occupied square the attack set is clipped to
//! `BETWEEN[origin][blocker] | blocker`, where `blocker` is whichever
//! occupied square is nearest `origin`. No PEXT/magic-bitboard tables are
//! involved: this trades a few extra bitwise operations per slider move for
//! being fully computable at compile time and easy to audit.

use super::bitboard::Bitboard;
use super::core::{PieceType, Side, Square};
use super::tables::{
    BETWEEN, BLACK_PAWN_ATTACKS, DIRECTION_INCREASING, FAR_SQUARE, KING_ATTACKS, KNIGHT_ATTACKS,
    WHITE_PAWN_ATTACKS,
};

/// Rook-like ray direction indices into [`super::tables::SLIDER_DIRECTIONS`]: E, W,
/// N, S.
const ROOK_DIRECTIONS: [usize; 4] = [0, 1, 2, 3];
/// Bishop-like ray direction indices into [`super::tables::SLIDER_DIRECTIONS`]: NE,
/// SE, NW, SW.
const BISHOP_DIRECTIONS: [usize; 4] = [4, 5, 6, 7];

/// The full (unblocked) ray from `origin` in a single direction, to the edge
/// of the board.
fn ray(origin: Square, direction: usize) -> Bitboard {
    let edge = FAR_SQUARE[origin.index() as usize][direction];
    if edge == Square::NONE.index() {
        return Bitboard::EMPTY;
    }
    let edge = Square::from_index(edge);
    Bitboard::new(BETWEEN[origin.index() as usize][edge.index() as usize]).with(edge)
}

/// Attacks from `origin` along the given ray directions, stopping at (and
/// including) the first occupied square in each direction.
fn sliding_attacks(origin: Square, occupied: Bitboard, directions: &[usize]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &direction in directions {
        let full_ray = ray(origin, direction);
        let blockers = full_ray & occupied;
        attacks |= if blockers.is_empty() {
            full_ray
        } else {
            let nearest = if DIRECTION_INCREASING[direction] {
                blockers.first_square()
            } else {
                blockers.last_square()
            };
            Bitboard::new(BETWEEN[origin.index() as usize][nearest.index() as usize])
                .with(nearest)
        };
    }
    attacks
}

/// Squares a bishop on `origin` attacks given `occupied` (all pieces on the
/// board, regardless of color).
#[must_use]
pub fn bishop_attacks(origin: Square, occupied: Bitboard) -> Bitboard {
    sliding_attacks(origin, occupied, &BISHOP_DIRECTIONS)
}

/// Squares a rook on `origin` attacks given `occupied`.
#[must_use]
pub fn rook_attacks(origin: Square, occupied: Bitboard) -> Bitboard {
    sliding_attacks(origin, occupied, &ROOK_DIRECTIONS)
}

/// Squares a queen on `origin` attacks given `occupied`.
#[must_use]
pub fn queen_attacks(origin: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(origin, occupied) | rook_attacks(origin, occupied)
}

/// Squares a knight on `origin` attacks. Does not depend on occupancy.
#[must_use]
pub fn knight_attacks(origin: Square) -> Bitboard {
    Bitboard::new(KNIGHT_ATTACKS[origin.index() as usize])
}

/// Squares a king on `origin` attacks (one step in any direction). Does not
/// depend on occupancy or castling.
#[must_use]
pub fn king_attacks(origin: Square) -> Bitboard {
    Bitboard::new(KING_ATTACKS[origin.index() as usize])
}

/// Squares a pawn of `side` standing on `origin` attacks diagonally (capture
/// squares, not the straight push).
#[must_use]
pub fn pawn_attacks(side: Side, origin: Square) -> Bitboard {
    let table = match side {
        Side::White => &WHITE_PAWN_ATTACKS,
        Side::Black => &BLACK_PAWN_ATTACKS,
    };
    Bitboard::new(table[origin.index() as usize])
}

/// Squares a piece of `kind` belonging to `side` standing on `origin`
/// attacks given `occupied`. Does not apply to [`PieceType::None`].
///
/// # Panics
///
/// Panics if `kind` is [`PieceType::None`].
#[must_use]
pub fn attacks(kind: PieceType, side: Side, origin: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceType::Pawn => pawn_attacks(side, origin),
        PieceType::Knight => knight_attacks(origin),
        PieceType::Bishop => bishop_attacks(origin, occupied),
        PieceType::Rook => rook_attacks(origin, occupied),
        PieceType::Queen => queen_attacks(origin, occupied),
        PieceType::King => king_attacks(origin),
        PieceType::None => unreachable!("PieceType::None has no attack pattern"),
    }
}

/// Whether `target` is attacked by any piece of `side` given the board's
/// `occupied` squares and per-(side, kind) bitboards, supplied as a
/// callback so this function stays independent of [`Position`](super::position::Position)'s
/// storage layout.
pub fn is_attacked_by(
    target: Square,
    side: Side,
    occupied: Bitboard,
    pieces_of: impl Fn(PieceType) -> Bitboard,
) -> bool {
    if !(pawn_attacks(side.flip(), target) & pieces_of(PieceType::Pawn)).is_empty() {
        return true;
    }
    if !(knight_attacks(target) & pieces_of(PieceType::Knight)).is_empty() {
        return true;
    }
    if !(king_attacks(target) & pieces_of(PieceType::King)).is_empty() {
        return true;
    }
    let diagonal_attackers = pieces_of(PieceType::Bishop) | pieces_of(PieceType::Queen);
    if !(bishop_attacks(target, occupied) & diagonal_attackers).is_empty() {
        return true;
    }
    let orthogonal_attackers = pieces_of(PieceType::Rook) | pieces_of(PieceType::Queen);
    if !(rook_attacks(target, occupied) & orthogonal_attackers).is_empty() {
        return true;
    }
    false
}

/// Squares strictly between `a` and `b` if they share a rank, file or
/// diagonal, and an empty set otherwise. Thin wrapper over
/// [`BETWEEN`] for callers outside this module (pin detection,
/// castling-path checks).
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    Bitboard::new(BETWEEN[a.index() as usize][b.index() as usize])
}

/// Whether `b` lies on the segment from `a` to `c` (inclusive), i.e. on a
/// rank, file or diagonal shared by `a` and `c`, and not beyond either
/// endpoint. Used to check whether a pinned piece's destination keeps it on
/// the pin line, and whether a move blocks a checking slider.
#[must_use]
pub fn squares_aligned(a: Square, b: Square, c: Square) -> bool {
    if a == c {
        return a == b;
    }
    between(a, c).with(a).with(c).contains(b)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
    use crate::chess::bitboard::Bitboard;
    use crate::chess::core::Square;

    #[test]
    fn rook_attacks_on_empty_board() {
        let attacks = rook_attacks(Square::A1, Bitboard::EMPTY);
        assert_eq!(attacks.len(), 14, "7 squares along the a-file + 7 along rank 1");
    }

    #[test]
    fn rook_attacks_blocked() {
        let occupied = Bitboard::from_square(Square::A4);
        let attacks = rook_attacks(Square::A1, occupied);
        assert!(attacks.contains(Square::A4), "blocker itself is attacked");
        assert!(!attacks.contains(Square::A5), "beyond the blocker is not");
        assert!(attacks.contains(Square::A2) && attacks.contains(Square::A3));
    }

    #[test]
    fn bishop_attacks_from_center() {
        let attacks = bishop_attacks(Square::D4, Bitboard::EMPTY);
        assert_eq!(attacks.len(), 13);
        assert!(attacks.contains(Square::A1));
        assert!(attacks.contains(Square::G7));
    }

    #[test]
    fn queen_attacks_is_union() {
        let occupied = Bitboard::EMPTY;
        let queen = queen_attacks(Square::D4, occupied);
        let rook = rook_attacks(Square::D4, occupied);
        let bishop = bishop_attacks(Square::D4, occupied);
        assert_eq!(queen, rook | bishop);
    }

    #[test]
    fn knight_attacks_count_from_center() {
        assert_eq!(knight_attacks(Square::D4).len(), 8);
    }

    #[test]
    fn king_attacks_count_from_corner() {
        assert_eq!(king_attacks(Square::A1).len(), 3);
    }
}
