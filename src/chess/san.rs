//! Standard Algebraic Notation encode/decode.
//!
//! Encoding walks a move's shape (castle, piece letter, disambiguation,
//! capture, promotion, check/mate suffix) directly off the position it was
//! played in. Decoding goes the other way: it normalizes away `+`/`#`/`!`/
//! `?`/old-style `ep` annotations and embedded newlines, then parses the
//! destination square, piece kind, promotion and disambiguator out of what
//! remains, and resolves the actual move by filtering
//! [`Position::legal_moves`] down to the unique candidate that matches —
//! trial-legality rather than reimplementing move generation's own rules
//! for what a disambiguator must mean. A token whose shape matches no
//! legal move but does match a pseudo-legal one is reported as
//! [`crate::Error::IllegalMove`] rather than a parse failure.

use super::core::{File, Piece, PieceType, Rank, Square};
use super::moves::Move;
use super::position::Position;
use crate::{Error, Result};

/// Null-move SAN token, accepted (and produced) in place of a move when
/// encoding or decoding [`Move::NULL`].
const NULL_MOVE_TOKEN: &str = "Z0";

/// Renders `mv` (assumed legal in `position`) as SAN, including the
/// check/checkmate suffix computed by actually playing the move.
#[must_use]
pub fn encode(position: &Position, mv: Move) -> String {
    if mv.is_null() {
        return NULL_MOVE_TOKEN.to_string();
    }

    let moving = position.piece_at(mv.from);
    let from_file = mv.from.file().index() as i8;
    let to_file = mv.to.file().index() as i8;
    let is_castle = moving.kind() == PieceType::King && (to_file - from_file).abs() >= 2;

    let mut san = String::new();
    if is_castle {
        san.push_str(if mv.to.file() == File::G { "O-O" } else { "O-O-O" });
    } else {
        let is_capture = !position.piece_at(mv.to).is_none()
            || (moving.kind() == PieceType::Pawn && mv.to == position.ep_destination());
        if moving.kind() == PieceType::Pawn {
            if is_capture {
                san.push_str(&mv.from.file().to_string());
                san.push('x');
            }
        } else {
            if let Some(letter) = moving.kind().letter() {
                san.push(letter);
            }
            san.push_str(&disambiguation(position, mv));
            if is_capture {
                san.push('x');
            }
        }
        san.push_str(&mv.to.to_string());
        if mv.is_promotion() {
            if let Some(letter) = mv.promotion.kind().letter() {
                san.push('=');
                san.push(letter);
            }
        }
    }

    let mut after = position.clone();
    let _ = after.do_move(mv, false);
    if after.is_king_attacked(after.side_to_move()) {
        san.push(if after.is_checkmate() { '#' } else { '+' });
    }
    san
}

/// The shortest disambiguator that tells `mv.from` apart from every other
/// legal move by a piece of the same kind landing on `mv.to`: nothing if
/// there's no ambiguity, otherwise file, then rank, then the full square.
fn disambiguation(position: &Position, mv: Move) -> String {
    let moving = position.piece_at(mv.from);
    let mut other_candidate = false;
    let mut same_file = false;
    let mut same_rank = false;
    for candidate in position.legal_moves() {
        if candidate.to != mv.to || candidate.from == mv.from {
            continue;
        }
        if position.piece_at(candidate.from) != moving {
            continue;
        }
        other_candidate = true;
        same_file |= candidate.from.file() == mv.from.file();
        same_rank |= candidate.from.rank() == mv.from.rank();
    }
    if !other_candidate {
        String::new()
    } else if !same_file {
        mv.from.file().to_string()
    } else if !same_rank {
        mv.from.rank().to_string()
    } else {
        mv.from.to_string()
    }
}

/// Parses `san` against `position`, resolving the move by filtering
/// [`Position::legal_moves`] down to the unique candidate consistent with
/// the parsed piece kind, destination, promotion and disambiguator. Returns
/// [`Error::Parse`] if no legal move matches, or if more than one does
/// (a genuinely ambiguous or malformed string; a correctly disambiguated
/// SAN for a legal position never has more than one match).
pub fn decode(position: &Position, san: &str) -> Result<Move> {
    decode_inner(position, san).map_err(|err| err.with_fen(position.to_fen()))
}

fn decode_inner(position: &Position, san: &str) -> Result<Move> {
    let trimmed = san.trim();
    if trimmed == NULL_MOVE_TOKEN {
        return Ok(Move::NULL);
    }

    let us = position.side_to_move();

    // Normalize away everything that isn't part of the move itself: check/
    // mate marks, NAG-style annotations, the old-style "ep" suffix, and any
    // embedded newlines from annotations glued onto the same token.
    let without_newlines: String;
    let cleaned = if trimmed.contains(['\n', '\r']) {
        without_newlines = trimmed.chars().filter(|ch| !matches!(ch, '\n' | '\r')).collect();
        without_newlines.as_str()
    } else {
        trimmed
    };
    let mut core = cleaned.trim_end_matches(['+', '#', '!', '?']);
    if let Some(stripped) = core.strip_suffix("ep") {
        core = stripped.trim_end_matches(['+', '#', '!', '?']);
    }

    if core == "O-O-O" {
        let path = position.context().queen_side[us.index()];
        return Ok(Move::new(path.king_from, path.king_to, Piece::None));
    }
    if core == "O-O" {
        let path = position.context().king_side[us.index()];
        return Ok(Move::new(path.king_from, path.king_to, Piece::None));
    }

    let (body, promotion_letter) = match core.split_once('=') {
        Some((body, letter)) => (body, Some(letter)),
        None => (core, None),
    };
    let promotion_kind = match promotion_letter {
        None => PieceType::None,
        Some("Q") => PieceType::Queen,
        Some("R") => PieceType::Rook,
        Some("B") => PieceType::Bishop,
        Some("N") => PieceType::Knight,
        Some(_) => return Err(Error::parse("unknown promotion letter", san)),
    };

    let chars: Vec<char> = body.chars().collect();
    if chars.len() < 2 {
        return Err(Error::parse("move is too short to contain a destination square", san));
    }
    let destination_str: String = chars[chars.len() - 2..].iter().collect();
    let destination = Square::try_from(destination_str.as_str())?;
    let head: String = chars[..chars.len() - 2].iter().filter(|&&ch| ch != 'x').collect();

    let (kind, disambiguator) = match head.chars().next() {
        Some(letter @ ('N' | 'B' | 'R' | 'Q' | 'K')) => {
            let kind = match letter {
                'N' => PieceType::Knight,
                'B' => PieceType::Bishop,
                'R' => PieceType::Rook,
                'Q' => PieceType::Queen,
                _ => PieceType::King,
            };
            (kind, head[letter.len_utf8()..].to_string())
        },
        _ => (PieceType::Pawn, head),
    };

    let matches_shape = |mv: &Move| {
        mv.to == destination
            && position.piece_at(mv.from).kind() == kind
            && mv.promotion.kind() == promotion_kind
            && disambiguator_matches(&disambiguator, mv.from)
    };

    let mut legal = position.legal_moves().into_iter().filter(matches_shape);
    let Some(mv) = legal.next() else {
        // No legal move has this shape. Distinguish a token that never named
        // a real move (a true parse failure) from one that named a move the
        // Legality Filter rejects (the king would be left in check) — the
        // latter is reported as `Error::IllegalMove`, per spec.
        let mut pseudo_legal = super::movegen::generate_pseudo_legal(position).into_iter().filter(matches_shape);
        return match pseudo_legal.next() {
            Some(rejected) => Err(Error::illegal_move(rejected.to_uci(), position.to_fen())),
            None => Err(Error::parse("no legal move matches this SAN", san)),
        };
    };
    if legal.next().is_some() {
        return Err(Error::parse("SAN is ambiguous among legal moves", san));
    }
    Ok(mv)
}

fn disambiguator_matches(disambiguator: &str, from: Square) -> bool {
    match disambiguator.chars().count() {
        0 => true,
        1 => match disambiguator.chars().next() {
            Some(ch) if ch.is_ascii_digit() => Rank::try_from(ch).map(|rank| rank == from.rank()).unwrap_or(false),
            Some(ch) => File::try_from(ch).map(|file| file == from.file()).unwrap_or(false),
            None => false,
        },
        _ => disambiguator == from.to_string(),
    }
}
