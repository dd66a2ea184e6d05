//! Move generation: turns a [`Position`]'s piece placement into
//! [`MoveList`]s of pseudo-legal or legal moves.
//!
//! Pseudo-legal generation only respects how each piece kind moves and
//! whose pieces occupy which squares; it does not check whether the
//! resulting position leaves the mover's own king in check. Legal
//! generation (what most callers want) filters pseudo-legal moves through
//! [`Position`]'s private Legality Filter by replaying each one via
//! [`Position::do_move`]/[`Position::undo_move`] on a scratch clone.

use super::attacks;
use super::core::{Piece, PieceType, Rank, Side, Square};
use super::moves::{CastleRights, Move, MoveList};
use super::position::Position;

/// Every pseudo-legal move in `position` for the side to move: legal piece
/// movement patterns against the current occupancy, without checking
/// whether the mover's king ends up in check.
#[must_use]
pub fn generate_pseudo_legal(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();
    let own = position.bb_of_side(us);
    let occupied = position.bb_all();

    generate_pawn_moves(position, us, &mut moves);

    for kind in [
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ] {
        for origin in position.bb_of_kind(us, kind) {
            let targets = attacks::attacks(kind, us, origin, occupied) & !own;
            for to in targets {
                moves.push(Move::new(origin, to, Piece::None));
            }
        }
    }

    generate_castles(position, us, &mut moves);
    moves
}

/// The subset of pseudo-legal moves that capture a piece (including
/// en-passant).
#[must_use]
pub fn generate_pseudo_legal_captures(position: &Position) -> MoveList {
    generate_pseudo_legal(position)
        .into_iter()
        .filter(|mv| !position.piece_at(mv.to).is_none() || mv.to == position.ep_destination())
        .collect()
}

/// Every legal move in `position`: pseudo-legal moves that survive a
/// do/undo round-trip through the Legality Filter.
#[must_use]
pub fn generate_legal(position: &Position) -> MoveList {
    let pseudo_legal = generate_pseudo_legal(position);
    let mut scratch = position.clone();
    pseudo_legal
        .into_iter()
        .filter(|&mv| {
            if scratch.do_move(mv, false) {
                scratch.undo_move();
                true
            } else {
                false
            }
        })
        .collect()
}

fn generate_pawn_moves(position: &Position, us: Side, moves: &mut MoveList) {
    let occupied = position.bb_all();
    let enemy = position.bb_of_side(us.flip());
    let (push_delta, start_rank, promotion_rank): (i32, Rank, Rank) = match us {
        Side::White => (8, Rank::Two, Rank::Eight),
        Side::Black => (-8, Rank::Seven, Rank::One),
    };

    for origin in position.bb_of_kind(us, PieceType::Pawn) {
        if let Some(single) = step_square(origin, push_delta) {
            if !occupied.contains(single) {
                push_pawn_move(moves, us, origin, single, promotion_rank);
                if origin.rank() == start_rank {
                    if let Some(double) = step_square(single, push_delta) {
                        if !occupied.contains(double) {
                            moves.push(Move::new(origin, double, Piece::None));
                        }
                    }
                }
            }
        }

        for to in attacks::pawn_attacks(us, origin) {
            if enemy.contains(to) {
                push_pawn_move(moves, us, origin, to, promotion_rank);
            } else if to == position.ep_destination() {
                moves.push(Move::new(origin, to, Piece::None));
            }
        }
    }
}

fn push_pawn_move(moves: &mut MoveList, side: Side, from: Square, to: Square, promotion_rank: Rank) {
    if to.rank() == promotion_rank {
        for &kind in &PieceType::PROMOTIONS {
            moves.push(Move::new(from, to, Piece::make(side, kind)));
        }
    } else {
        moves.push(Move::new(from, to, Piece::None));
    }
}

/// Steps a square by a linear index delta (`+8`/`-8` for a pawn push),
/// returning `None` if it would leave the board. Pawns never wrap files on a
/// straight push, so no file-boundary check is needed here.
fn step_square(square: Square, delta: i32) -> Option<Square> {
    let next = square.index() as i32 + delta;
    if !(0..64).contains(&next) {
        return None;
    }
    Some(Square::from_index(next as u8))
}

/// Counts the number of leaf positions `depth` plies below `position`,
/// playing only legal moves. The classic move-generation correctness
/// benchmark: `perft(&Position::starting(), 5) == 4_865_609`.
#[must_use]
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut scratch = position.clone();
    let mut nodes = 0;
    for mv in generate_legal(position) {
        assert!(scratch.do_move(mv, false), "generated move must be legal");
        nodes += perft(&scratch, depth - 1);
        assert!(scratch.undo_move());
    }
    nodes
}

fn generate_castles(position: &Position, us: Side, moves: &mut MoveList) {
    let rights = position.castle_right(us);
    let occupied = position.bb_all();
    let context = position.context();

    if rights.contains(CastleRights::KING_SIDE) {
        let path = context.king_side[us.index()];
        if (occupied & path.empty_squares).is_empty() {
            moves.push(Move::new(path.king_from, path.king_to, Piece::None));
        }
    }
    if rights.contains(CastleRights::QUEEN_SIDE) {
        let path = context.queen_side[us.index()];
        if (occupied & path.empty_squares).is_empty() {
            moves.push(Move::new(path.king_from, path.king_to, Piece::None));
        }
    }
}
