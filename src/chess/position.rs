//! [`Position`]: the full state of one point in a chess game — piece
//! placement, whose turn it is, castling rights, the en-passant pair, the
//! move counters, and the incrementally maintained [`Key`].
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;

use super::attacks;
use super::bitboard::Bitboard;
use super::core::{File, Piece, PieceType, Rank, Side, Square};
use super::movegen;
use super::moves::{CastleRights, CastlingPath, GameContext, Move, MoveList, UndoEntry};
use super::zobrist::{self, History, Key};
use crate::{Error, Result};

/// Standard starting position, White to move, full rights, no en-passant.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Full state of one point in a chess game.
///
/// Parsed from or serialized to FEN (see [`Position::from_fen`] and
/// [`Position::to_fen`]), mutated by [`Position::do_move`],
/// [`Position::undo_move`] and [`Position::do_null_move`], and queried
/// through a handful of accessors (`piece_at`, `bb_of`, ...) rather than by
/// reaching into its fields, none of which are `pub`.
///
/// Cloning a [`Position`] is cheap (every field but the undo stack and
/// history is `Copy`) and does not carry over registered [`Position::on_change`]
/// listeners: a clone is an independent value, and a `Box<dyn FnMut>` can't
/// be cloned anyway.
pub struct Position {
    piece_at: [Piece; 64],
    /// Indexed by [`Piece::ordinal`].
    piece_bb: [Bitboard; 12],
    /// Indexed by [`Side::index`].
    side_bb: [Bitboard; 2],
    side_to_move: Side,
    /// Indexed by [`Side::index`].
    castle_rights: [CastleRights; 2],
    /// Square a capturing pawn would land on, or [`Square::NONE`].
    ep_destination: Square,
    /// Square the captured pawn actually stands on, or [`Square::NONE`].
    ep_target: Square,
    half_move_counter: u32,
    full_move_counter: u32,
    hash: Key,
    history: History,
    undo_stack: Vec<UndoEntry>,
    context: GameContext,
    listeners: Vec<Box<dyn FnMut(&Position) + Send>>,
}

impl Position {
    /// An empty board, White to move, no rights, no en-passant, move one.
    /// Not exposed: every [`Position`] a caller can observe is either the
    /// starting position or parsed from a FEN, so it's always structurally
    /// complete (kings included).
    fn empty() -> Self {
        Self {
            piece_at: [Piece::None; 64],
            piece_bb: [Bitboard::EMPTY; 12],
            side_bb: [Bitboard::EMPTY; 2],
            side_to_move: Side::White,
            castle_rights: [CastleRights::empty(); 2],
            ep_destination: Square::NONE,
            ep_target: Square::NONE,
            half_move_counter: 0,
            full_move_counter: 1,
            hash: 0,
            history: History::new(),
            undo_stack: Vec::new(),
            context: GameContext::default(),
            listeners: Vec::new(),
        }
    }

    /// The standard starting position.
    #[must_use]
    pub fn starting() -> Self {
        let mut position = Self::empty();
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (file_index, &kind) in BACK_RANK.iter().enumerate() {
            let file = File::from_index(file_index as u8);
            position.set_piece(Square::new(file, Rank::One), Piece::make(Side::White, kind));
            position.set_piece(
                Square::new(file, Rank::Two),
                Piece::make(Side::White, PieceType::Pawn),
            );
            position.set_piece(
                Square::new(file, Rank::Seven),
                Piece::make(Side::Black, PieceType::Pawn),
            );
            position.set_piece(Square::new(file, Rank::Eight), Piece::make(Side::Black, kind));
        }
        position.castle_rights = [CastleRights::all(); 2];
        position.hash = position.recompute_hash();
        position.history.push(position.hash);
        position
    }

    /// Parses a FEN string. Tolerates a missing half-move/full-move suffix
    /// (defaulting to `0 1`), matching the EPD-style position strings common
    /// in opening books and test suites.
    pub fn from_fen(fen: &str) -> Result<Self> {
        Self::parse_fen(fen).map_err(|err| err.with_fen(fen.trim()))
    }

    fn parse_fen(fen: &str) -> Result<Self> {
        let trimmed = fen.trim();
        let mut fields = trimmed.split_whitespace();
        let placement = fields
            .next()
            .ok_or_else(|| Error::parse("missing piece placement field", trimmed))?;
        let side_field = fields.next().unwrap_or("w");
        let castling_field = fields.next().unwrap_or("-");
        let ep_field = fields.next().unwrap_or("-");
        let half_move_field = fields.next().unwrap_or("0");
        let full_move_field = fields.next().unwrap_or("1");

        let mut position = Self::empty();

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(Error::parse(
                format!("expected 8 ranks separated by '/', got {}", ranks.len()),
                placement,
            ));
        }
        for (rank_from_top, rank_fen) in ranks.iter().enumerate() {
            let rank = Rank::from_index(7 - rank_from_top as u8);
            let mut file_index: u8 = 0;
            for symbol in rank_fen.chars() {
                if let Some(empty_run) = symbol.to_digit(10) {
                    file_index += empty_run as u8;
                } else {
                    if file_index >= 8 {
                        return Err(Error::parse("rank has more than 8 files", *rank_fen));
                    }
                    let piece = Piece::try_from(symbol)?;
                    position.set_piece(Square::new(File::from_index(file_index), rank), piece);
                    file_index += 1;
                }
            }
            if file_index != 8 {
                return Err(Error::parse("rank does not sum to 8 files", *rank_fen));
            }
        }

        for (side, name) in [(Side::White, "White"), (Side::Black, "Black")] {
            let kings = position.bb_of_kind(side, PieceType::King).len();
            if kings != 1 {
                return Err(Error::parse(
                    format!("expected exactly one {name} king, got {kings}"),
                    placement,
                ));
            }
        }

        position.side_to_move = Side::try_from(side_field)?;

        if castling_field != "-" {
            for symbol in castling_field.chars() {
                let (side, right) = match symbol {
                    'K' => (Side::White, CastleRights::KING_SIDE),
                    'Q' => (Side::White, CastleRights::QUEEN_SIDE),
                    'k' => (Side::Black, CastleRights::KING_SIDE),
                    'q' => (Side::Black, CastleRights::QUEEN_SIDE),
                    _ => {
                        return Err(Error::parse(
                            format!("unknown castling right '{symbol}'"),
                            castling_field,
                        ))
                    },
                };
                position.castle_rights[side.index()] |= right;
            }
        }

        if ep_field != "-" {
            let ep_destination = Square::try_from(ep_field)?;
            let capturing_rank = match position.side_to_move {
                Side::White => ep_destination.rank().index() as i8 - 1,
                Side::Black => ep_destination.rank().index() as i8 + 1,
            };
            let ep_target = Square::new(ep_destination.file(), Rank::from_index(capturing_rank as u8));
            if position.ep_is_advertisable(position.side_to_move, ep_target) {
                position.ep_destination = ep_destination;
                position.ep_target = ep_target;
            }
        }

        position.half_move_counter = half_move_field
            .parse()
            .map_err(|_| Error::parse("expected a non-negative integer", half_move_field))?;
        position.full_move_counter = full_move_field
            .parse()
            .map_err(|_| Error::parse("expected a positive integer", full_move_field))?;

        position.hash = position.recompute_hash();
        position.history.push(position.hash);
        Ok(position)
    }

    /// Serializes to a full six-field FEN.
    #[must_use]
    pub fn to_fen(&self) -> String {
        self.to_fen_with(true)
    }

    /// Serializes to FEN, optionally dropping the half-move/full-move
    /// suffix (matching EPD-style consumers that don't track it).
    #[must_use]
    pub fn to_fen_with(&self, include_counters: bool) -> String {
        let mut fen = String::new();
        for rank_from_top in 0..8u8 {
            let rank = Rank::from_index(7 - rank_from_top);
            let mut empty_run = 0u8;
            for file_index in 0..8u8 {
                let square = Square::new(File::from_index(file_index), rank);
                let piece = self.piece_at(square);
                if piece.is_none() {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        fen.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    fen.push(piece.fen_char());
                }
            }
            if empty_run > 0 {
                fen.push((b'0' + empty_run) as char);
            }
            if rank_from_top != 7 {
                fen.push('/');
            }
        }
        fen.push(' ');
        fen.push_str(&self.side_to_move.to_string());
        fen.push(' ');
        let mut castling = String::new();
        if self.castle_rights[Side::White.index()].contains(CastleRights::KING_SIDE) {
            castling.push('K');
        }
        if self.castle_rights[Side::White.index()].contains(CastleRights::QUEEN_SIDE) {
            castling.push('Q');
        }
        if self.castle_rights[Side::Black.index()].contains(CastleRights::KING_SIDE) {
            castling.push('k');
        }
        if self.castle_rights[Side::Black.index()].contains(CastleRights::QUEEN_SIDE) {
            castling.push('q');
        }
        fen.push_str(if castling.is_empty() { "-" } else { &castling });
        fen.push(' ');
        fen.push_str(&self.ep_destination.to_string());
        if include_counters {
            fen.push(' ');
            fen.push_str(&self.half_move_counter.to_string());
            fen.push(' ');
            fen.push_str(&self.full_move_counter.to_string());
        }
        fen
    }

    // --- Position State (accessors) -------------------------------------

    #[must_use]
    pub fn piece_at(&self, square: Square) -> Piece {
        self.piece_at[square.index() as usize]
    }

    /// All squares occupied by `piece`. Empty for [`Piece::None`].
    #[must_use]
    pub fn bb_of(&self, piece: Piece) -> Bitboard {
        if piece.is_none() {
            Bitboard::EMPTY
        } else {
            self.piece_bb[piece.ordinal()]
        }
    }

    /// All squares occupied by a piece of `kind` owned by `side`.
    #[must_use]
    pub fn bb_of_kind(&self, side: Side, kind: PieceType) -> Bitboard {
        self.bb_of(Piece::make(side, kind))
    }

    #[must_use]
    pub fn bb_of_side(&self, side: Side) -> Bitboard {
        self.side_bb[side.index()]
    }

    #[must_use]
    pub fn bb_all(&self) -> Bitboard {
        self.side_bb[Side::White.index()] | self.side_bb[Side::Black.index()]
    }

    #[must_use]
    pub const fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[must_use]
    pub fn them(&self) -> Side {
        self.side_to_move.flip()
    }

    #[must_use]
    pub fn castle_right(&self, side: Side) -> CastleRights {
        self.castle_rights[side.index()]
    }

    #[must_use]
    pub const fn ep_destination(&self) -> Square {
        self.ep_destination
    }

    #[must_use]
    pub const fn ep_target(&self) -> Square {
        self.ep_target
    }

    #[must_use]
    pub const fn half_move_counter(&self) -> u32 {
        self.half_move_counter
    }

    #[must_use]
    pub const fn full_move_counter(&self) -> u32 {
        self.full_move_counter
    }

    #[must_use]
    pub const fn incremental_hash(&self) -> Key {
        self.hash
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn context(&self) -> &GameContext {
        &self.context
    }

    #[must_use]
    pub fn king_square(&self, side: Side) -> Square {
        self.bb_of_kind(side, PieceType::King).first_square()
    }

    /// Registers a listener invoked (in registration order, with no other
    /// ordering guarantee) after every [`Position::do_move`],
    /// [`Position::undo_move`] and [`Position::do_null_move`] settles. Not a
    /// global or thread-local registry: listeners belong to this value and
    /// are dropped, not inherited, when it's cloned.
    pub fn on_change(&mut self, listener: impl FnMut(&Self) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify_listeners(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in &mut listeners {
            listener(self);
        }
        self.listeners = listeners;
    }

    // --- Raw placement ----------------------------------------------------

    /// Places `piece` on `square`, toggling its bitboards and XORing its
    /// Zobrist key in. Does not check whether `square` was already occupied;
    /// callers (FEN parsing, [`Position::do_move`]) are responsible for
    /// clearing a square first if needed. A no-op for [`Piece::None`].
    pub fn set_piece(&mut self, square: Square, piece: Piece) {
        let Some(side) = piece.side() else { return };
        self.piece_at[square.index() as usize] = piece;
        self.piece_bb[piece.ordinal()] = self.piece_bb[piece.ordinal()].with(square);
        self.side_bb[side.index()] = self.side_bb[side.index()].with(square);
        self.hash ^= zobrist::piece_square_key(piece, square);
    }

    /// Removes whatever piece stands on `square`, toggling its bitboards and
    /// XORing its Zobrist key out. A no-op if `square` is already empty.
    pub fn unset_piece(&mut self, square: Square) {
        let piece = self.piece_at(square);
        let Some(side) = piece.side() else { return };
        self.piece_at[square.index() as usize] = Piece::None;
        self.piece_bb[piece.ordinal()] = self.piece_bb[piece.ordinal()].without(square);
        self.side_bb[side.index()] = self.side_bb[side.index()].without(square);
        self.hash ^= zobrist::piece_square_key(piece, square);
    }

    fn recompute_hash(&self) -> Key {
        let mut hash = 0;
        for square in Square::all() {
            let piece = self.piece_at(square);
            if !piece.is_none() {
                hash ^= zobrist::piece_square_key(piece, square);
            }
        }
        for side in [Side::White, Side::Black] {
            hash ^= zobrist::castle_right_key(self.castle_rights[side.index()].bits(), side);
        }
        if !self.ep_destination.is_none() {
            hash ^= zobrist::ep_key(self.ep_destination);
        }
        hash ^ zobrist::side_to_move_key(self.side_to_move)
    }

    // --- Move execution & undo --------------------------------------------

    /// Attempts to play `mv`. Always runs the [Legality Filter](king safety)
    /// check; when `full_validation` is set, additionally checks that `mv`
    /// has a sensible shape in this position (the piece on `from` belongs to
    /// the side to move, `to` doesn't hold a same-color piece, and a
    /// promotion piece is present iff a pawn reaches the back rank). Returns
    /// whether the move was applied.
    ///
    /// Generated moves (from [`movegen`]) are already known to have a valid
    /// shape, so internal callers such as perft can skip that check by
    /// passing `full_validation: false` and rely on the (always-enforced)
    /// king-safety check alone.
    pub fn do_move(&mut self, mv: Move, full_validation: bool) -> bool {
        if full_validation && !self.has_valid_shape(mv) {
            return false;
        }
        if !self.move_is_legal(mv) {
            return false;
        }
        self.apply_move(mv);
        true
    }

    fn has_valid_shape(&self, mv: Move) -> bool {
        if mv.is_null() {
            return false;
        }
        let moving = self.piece_at(mv.from);
        if moving.side() != Some(self.side_to_move) {
            return false;
        }
        if self.piece_at(mv.to).side() == Some(self.side_to_move) {
            return false;
        }
        let reaches_terminal_rank = moving.kind() == PieceType::Pawn
            && (mv.to.rank() == Rank::Eight || mv.to.rank() == Rank::One);
        if reaches_terminal_rank != mv.is_promotion() {
            return false;
        }
        if mv.is_promotion() && mv.promotion.side() != Some(self.side_to_move) {
            return false;
        }
        true
    }

    /// The Legality Filter: does playing `mv` leave the mover's own king in
    /// check? Computed directly from the current state, without applying
    /// the move, by checking whether the post-move occupancy would expose
    /// the king to an attacker along any of the four attack patterns.
    fn move_is_legal(&self, mv: Move) -> bool {
        let us = self.side_to_move;
        let them = us.flip();
        let moving_piece = self.piece_at(mv.from);

        if moving_piece.kind() == PieceType::King {
            let from_file = mv.from.file().index() as i8;
            let to_file = mv.to.file().index() as i8;
            if (to_file - from_file).abs() >= 2 {
                return self.castle_is_legal(us, mv.to);
            }
        }

        let is_ep_capture = moving_piece.kind() == PieceType::Pawn
            && !self.ep_destination.is_none()
            && mv.to == self.ep_destination;
        let captured_square = if is_ep_capture { self.ep_target } else { mv.to };

        let king_square = if moving_piece.kind() == PieceType::King {
            mv.to
        } else {
            self.king_square(us)
        };

        let mut occupancy = self.bb_all().without(mv.from).with(mv.to);
        if !self.piece_at(captured_square).is_none() {
            occupancy = occupancy.without(captured_square);
        }

        let enemy_king = self.king_square(them);
        if !(attacks::king_attacks(king_square) & Bitboard::from_square(enemy_king)).is_empty() {
            return false;
        }

        let diagonal_attackers =
            (self.bb_of_kind(them, PieceType::Bishop) | self.bb_of_kind(them, PieceType::Queen))
                .without(captured_square);
        if !(attacks::bishop_attacks(king_square, occupancy) & diagonal_attackers).is_empty() {
            return false;
        }
        let orthogonal_attackers =
            (self.bb_of_kind(them, PieceType::Rook) | self.bb_of_kind(them, PieceType::Queen))
                .without(captured_square);
        if !(attacks::rook_attacks(king_square, occupancy) & orthogonal_attackers).is_empty() {
            return false;
        }
        let knights = self.bb_of_kind(them, PieceType::Knight).without(captured_square);
        if !(attacks::knight_attacks(king_square) & knights).is_empty() {
            return false;
        }
        let pawns = self.bb_of_kind(them, PieceType::Pawn).without(captured_square);
        if !(attacks::pawn_attacks(us, king_square) & pawns).is_empty() {
            return false;
        }

        true
    }

    fn castle_is_legal(&self, side: Side, king_to: Square) -> bool {
        let is_king_side = king_to.file() == File::G;
        let path = if is_king_side {
            self.context.king_side[side.index()]
        } else {
            self.context.queen_side[side.index()]
        };
        let required = if is_king_side {
            CastleRights::KING_SIDE
        } else {
            CastleRights::QUEEN_SIDE
        };
        if !self.castle_rights[side.index()].contains(required) {
            return false;
        }
        if !(self.bb_all() & path.empty_squares).is_empty() {
            return false;
        }
        let opponent = side.flip();
        for square in path.safe_squares {
            if self.is_square_attacked(square, opponent) {
                return false;
            }
        }
        true
    }

    fn is_square_attacked(&self, square: Square, by_side: Side) -> bool {
        attacks::is_attacked_by(square, by_side, self.bb_all(), |kind| {
            self.bb_of_kind(by_side, kind)
        })
    }

    /// Whether `side`'s king is currently attacked.
    #[must_use]
    pub fn is_king_attacked(&self, side: Side) -> bool {
        self.is_square_attacked(self.king_square(side), side.flip())
    }

    fn apply_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.flip();
        let moving_piece = self.piece_at(mv.from);
        let from_file = mv.from.file().index() as i8;
        let to_file = mv.to.file().index() as i8;
        let is_castle = moving_piece.kind() == PieceType::King && (to_file - from_file).abs() >= 2;

        let is_ep_capture = moving_piece.kind() == PieceType::Pawn
            && !self.ep_destination.is_none()
            && mv.to == self.ep_destination;
        let (captured, captured_square) = if is_ep_capture {
            (self.piece_at(self.ep_target), self.ep_target)
        } else {
            (self.piece_at(mv.to), mv.to)
        };

        let undo = UndoEntry {
            mv,
            captured,
            captured_square,
            prior_castle_rights: self.castle_rights,
            prior_ep_destination: self.ep_destination,
            prior_ep_target: self.ep_target,
            prior_half_move_counter: self.half_move_counter,
            prior_hash: self.hash,
        };

        // Step 3: side-to-move and the current en-passant key leave the hash
        // before anything else changes.
        self.hash ^= zobrist::side_to_move_key(us);
        if !self.ep_destination.is_none() {
            self.hash ^= zobrist::ep_key(self.ep_destination);
        }

        // Steps 4/5: castling-rights bookkeeping, ahead of the piece move
        // itself so a king or rook move and the right it revokes land in the
        // same undo step.
        if moving_piece.kind() == PieceType::King {
            self.set_castle_rights(us, CastleRights::empty());
        } else if moving_piece.kind() == PieceType::Rook {
            self.clear_rook_right_if_home(us, mv.from);
        }

        // Step 4: the rook half of a castle moves alongside the king.
        if is_castle {
            let path: CastlingPath = if to_file > from_file {
                self.context.king_side[us.index()]
            } else {
                self.context.queen_side[us.index()]
            };
            let rook = self.piece_at(path.rook_from);
            self.unset_piece(path.rook_from);
            self.set_piece(path.rook_to, rook);
        }

        // Step 6: the primitive piece move, including en-passant's captured
        // square differing from the destination, and promotion.
        self.unset_piece(mv.from);
        if !captured.is_none() {
            self.unset_piece(captured_square);
        }
        if mv.is_promotion() {
            self.set_piece(mv.to, mv.promotion);
        } else {
            self.set_piece(mv.to, moving_piece);
        }

        // Step 7: a captured rook standing on its own home square revokes
        // that right for its side.
        if captured.kind() == PieceType::Rook {
            self.clear_rook_right_if_home(them, captured_square);
        }

        // Step 8: counters.
        if !captured.is_none() || moving_piece.kind() == PieceType::Pawn {
            self.half_move_counter = 0;
        } else {
            self.half_move_counter += 1;
        }
        if us == Side::Black {
            self.full_move_counter += 1;
        }

        // Step 9: the en-passant pair, advertised only if a legal capture
        // could actually follow.
        self.ep_destination = Square::NONE;
        self.ep_target = Square::NONE;
        if moving_piece.kind() == PieceType::Pawn {
            let from_rank = mv.from.rank().index() as i8;
            let to_rank = mv.to.rank().index() as i8;
            if (to_rank - from_rank).abs() == 2 {
                let crossed_rank = Rank::from_index(((from_rank + to_rank) / 2) as u8);
                let crossed = Square::new(mv.to.file(), crossed_rank);
                if self.ep_is_advertisable(them, mv.to) {
                    self.ep_destination = crossed;
                    self.ep_target = mv.to;
                    self.hash ^= zobrist::ep_key(crossed);
                }
            }
        }

        // Step 10: flip the side to move, restore its key, and record.
        self.side_to_move = them;
        self.hash ^= zobrist::side_to_move_key(them);
        self.history.push(self.hash);
        self.undo_stack.push(undo);

        self.notify_listeners();
    }

    fn set_castle_rights(&mut self, side: Side, new_rights: CastleRights) {
        let old_rights = self.castle_rights[side.index()];
        if old_rights == new_rights {
            return;
        }
        self.hash ^= zobrist::castle_right_key(old_rights.bits(), side);
        self.hash ^= zobrist::castle_right_key(new_rights.bits(), side);
        self.castle_rights[side.index()] = new_rights;
    }

    fn clear_rook_right_if_home(&mut self, side: Side, square: Square) {
        let king_side_home = self.context.king_side[side.index()].rook_from;
        let queen_side_home = self.context.queen_side[side.index()].rook_from;
        let mut rights = self.castle_rights[side.index()];
        if square == king_side_home {
            rights.remove(CastleRights::KING_SIDE);
        } else if square == queen_side_home {
            rights.remove(CastleRights::QUEEN_SIDE);
        } else {
            return;
        }
        self.set_castle_rights(side, rights);
    }

    /// Whether pushing a pawn to `pushed_to` should advertise an en-passant
    /// capture for `capturing_side`: there must be an adjacent capturing
    /// pawn, and removing both it and the pushed pawn (what the capture
    /// itself would do) must not expose `capturing_side`'s own king along
    /// the rank or a diagonal. Shared by move application (the pawn just
    /// double-pushed) and FEN loading (the ep field names the pushed-to
    /// square directly).
    fn ep_is_advertisable(&self, capturing_side: Side, pushed_to: Square) -> bool {
        let file = pushed_to.file().index();
        let rank = pushed_to.rank();
        let mut candidates = [None; 2];
        if file > 0 {
            candidates[0] = Some(Square::new(File::from_index(file - 1), rank));
        }
        if file < 7 {
            candidates[1] = Some(Square::new(File::from_index(file + 1), rank));
        }
        let capturing_pawn = Piece::make(capturing_side, PieceType::Pawn);
        candidates.into_iter().flatten().any(|candidate| {
            self.piece_at(candidate) == capturing_pawn
                && !self.ep_would_expose_check(capturing_side, candidate, pushed_to)
        })
    }

    fn ep_would_expose_check(&self, capturing_side: Side, capturing_pawn: Square, pushed_to: Square) -> bool {
        let king_square = self.king_square(capturing_side);
        let occupancy = self.bb_all().without(capturing_pawn).without(pushed_to);
        let defender = capturing_side.flip();
        let diagonal_attackers =
            self.bb_of_kind(defender, PieceType::Bishop) | self.bb_of_kind(defender, PieceType::Queen);
        if !(attacks::bishop_attacks(king_square, occupancy) & diagonal_attackers).is_empty() {
            return true;
        }
        let orthogonal_attackers =
            self.bb_of_kind(defender, PieceType::Rook) | self.bb_of_kind(defender, PieceType::Queen);
        if !(attacks::rook_attacks(king_square, occupancy) & orthogonal_attackers).is_empty() {
            return true;
        }
        false
    }

    /// Reverses the most recent [`Position::do_move`] or
    /// [`Position::do_null_move`]. Returns `false` if there is nothing to
    /// undo.
    pub fn undo_move(&mut self) -> bool {
        let Some(undo) = self.undo_stack.pop() else {
            return false;
        };
        self.history.pop();
        let them = self.side_to_move;
        let us = them.flip();
        self.side_to_move = us;

        let mv = undo.mv;
        if !mv.is_null() {
            let moved_kind = if mv.is_promotion() {
                PieceType::Pawn
            } else {
                self.piece_at(mv.to).kind()
            };
            let moved_piece = Piece::make(us, moved_kind);

            let from_file = mv.from.file().index() as i8;
            let to_file = mv.to.file().index() as i8;
            let is_castle = moved_kind == PieceType::King && (to_file - from_file).abs() >= 2;
            if is_castle {
                let path: CastlingPath = if to_file > from_file {
                    self.context.king_side[us.index()]
                } else {
                    self.context.queen_side[us.index()]
                };
                let rook = self.piece_at(path.rook_to);
                self.unset_piece(path.rook_to);
                self.set_piece(path.rook_from, rook);
            }

            self.unset_piece(mv.to);
            self.set_piece(mv.from, moved_piece);
            if !undo.captured.is_none() {
                self.set_piece(undo.captured_square, undo.captured);
            }
        }

        self.castle_rights = undo.prior_castle_rights;
        self.ep_destination = undo.prior_ep_destination;
        self.ep_target = undo.prior_ep_target;
        self.half_move_counter = undo.prior_half_move_counter;
        if us == Side::Black {
            self.full_move_counter -= 1;
        }
        self.hash = undo.prior_hash;

        self.notify_listeners();
        true
    }

    /// Plays a null move: flips the side to move without moving any piece.
    /// Used by search algorithms to probe "what if it were the opponent's
    /// turn right now"; reuses [`Position::undo_move`] to reverse itself.
    pub fn do_null_move(&mut self) {
        let us = self.side_to_move;
        let them = us.flip();
        let undo = UndoEntry {
            mv: Move::NULL,
            captured: Piece::None,
            captured_square: Square::NONE,
            prior_castle_rights: self.castle_rights,
            prior_ep_destination: self.ep_destination,
            prior_ep_target: self.ep_target,
            prior_half_move_counter: self.half_move_counter,
            prior_hash: self.hash,
        };

        self.hash ^= zobrist::side_to_move_key(us);
        if !self.ep_destination.is_none() {
            self.hash ^= zobrist::ep_key(self.ep_destination);
        }
        self.ep_destination = Square::NONE;
        self.ep_target = Square::NONE;
        self.half_move_counter += 1;
        if us == Side::Black {
            self.full_move_counter += 1;
        }
        self.side_to_move = them;
        self.hash ^= zobrist::side_to_move_key(them);

        self.history.push(self.hash);
        self.undo_stack.push(undo);
        self.notify_listeners();
    }

    // --- Move generation wrappers ------------------------------------------

    #[must_use]
    pub fn pseudo_legal_moves(&self) -> MoveList {
        movegen::generate_pseudo_legal(self)
    }

    #[must_use]
    pub fn pseudo_legal_captures(&self) -> MoveList {
        movegen::generate_pseudo_legal_captures(self)
    }

    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        movegen::generate_legal(self)
    }

    // --- Terminal queries ---------------------------------------------------

    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.is_king_attacked(self.side_to_move) && self.legal_moves().is_empty()
    }

    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.is_king_attacked(self.side_to_move) && self.legal_moves().is_empty()
    }

    /// Neither side has enough material to deliver checkmate by any legal
    /// sequence of moves: only kings; king+minor vs king; king+2 knights vs
    /// king; or a same-color bishop apiece with nothing else.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let queens = self.bb_of_kind(Side::White, PieceType::Queen) | self.bb_of_kind(Side::Black, PieceType::Queen);
        let rooks = self.bb_of_kind(Side::White, PieceType::Rook) | self.bb_of_kind(Side::Black, PieceType::Rook);
        let pawns = self.bb_of_kind(Side::White, PieceType::Pawn) | self.bb_of_kind(Side::Black, PieceType::Pawn);
        if !queens.is_empty() || !rooks.is_empty() || !pawns.is_empty() {
            return false;
        }

        let white_knights = self.bb_of_kind(Side::White, PieceType::Knight);
        let black_knights = self.bb_of_kind(Side::Black, PieceType::Knight);
        let white_bishops = self.bb_of_kind(Side::White, PieceType::Bishop);
        let black_bishops = self.bb_of_kind(Side::Black, PieceType::Bishop);
        let white_minors = white_knights.len() + white_bishops.len();
        let black_minors = black_knights.len() + black_bishops.len();

        if white_minors == 0 && black_minors == 0 {
            return true;
        }
        if white_minors + black_minors == 1 {
            return true;
        }
        if white_minors == 2 && black_minors == 0 && white_knights.len() == 2 {
            return true;
        }
        if black_minors == 2 && white_minors == 0 && black_knights.len() == 2 {
            return true;
        }
        if white_minors == 1 && black_minors == 1 && white_knights.is_empty() && black_knights.is_empty() {
            return square_color(white_bishops.first_square()) == square_color(black_bishops.first_square());
        }
        false
    }

    #[must_use]
    pub fn is_threefold_repetition(&self) -> bool {
        self.history.is_nfold_repetition(3, self.half_move_counter)
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.is_threefold_repetition()
            || self.is_insufficient_material()
            || self.half_move_counter >= 100
            || self.is_stalemate()
    }
}

/// `true` for light squares, `false` for dark squares.
fn square_color(square: Square) -> bool {
    (square.file().index() + square.rank().index()) % 2 == 0
}

impl Clone for Position {
    /// Clones every field except registered [`Position::on_change`]
    /// listeners, which start empty on the clone: they're closures over the
    /// original owner's state, not data that travels with the position.
    fn clone(&self) -> Self {
        Self {
            piece_at: self.piece_at,
            piece_bb: self.piece_bb,
            side_bb: self.side_bb,
            side_to_move: self.side_to_move,
            castle_rights: self.castle_rights,
            ep_destination: self.ep_destination,
            ep_target: self.ep_target,
            half_move_counter: self.half_move_counter,
            full_move_counter: self.full_move_counter,
            hash: self.hash,
            history: self.history.clone(),
            undo_stack: self.undo_stack.clone(),
            context: self.context,
            listeners: Vec::new(),
        }
    }
}

impl PartialEq for Position {
    /// Compares every field except listeners (which can't be compared).
    fn eq(&self, other: &Self) -> bool {
        self.piece_at == other.piece_at
            && self.piece_bb == other.piece_bb
            && self.side_bb == other.side_bb
            && self.side_to_move == other.side_to_move
            && self.castle_rights == other.castle_rights
            && self.ep_destination == other.ep_destination
            && self.ep_target == other.ep_target
            && self.half_move_counter == other.half_move_counter
            && self.full_move_counter == other.full_move_counter
            && self.hash == other.hash
            && self.history == other.history
            && self.undo_stack == other.undo_stack
            && self.context == other.context
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position").field("fen", &self.to_fen()).finish()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{Position, STARTING_FEN};
    use crate::chess::core::Square;
    use crate::chess::moves::Move;

    #[test]
    fn starting_position_matches_fen() {
        let from_constructor = Position::starting();
        let from_fen = Position::from_fen(STARTING_FEN).unwrap();
        assert_eq!(from_constructor, from_fen);
    }

    #[test]
    fn fen_roundtrip() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let position = Position::from_fen(fen).unwrap();
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn fen_tolerates_missing_counters() {
        let position = Position::from_fen(STARTING_FEN.trim_end_matches(" 0 1")).unwrap();
        assert_eq!(position.half_move_counter(), 0);
        assert_eq!(position.full_move_counter(), 1);
    }

    #[test]
    fn hash_matches_recomputation() {
        let position = Position::starting();
        assert_eq!(position.incremental_hash(), position.recompute_hash());
    }

    #[test]
    fn do_move_then_undo_restores_position() {
        let mut position = Position::starting();
        let before = position.clone();
        let mv = Move::new(Square::E2, Square::E4, crate::chess::core::Piece::None);
        assert!(position.do_move(mv, true));
        assert_ne!(position, before);
        assert!(position.undo_move());
        assert_eq!(position, before);
    }

    #[test]
    fn en_passant_capture_round_trip() {
        let mut position = Position::from_fen("8/8/8/8/3pP3/8/8/k6K b - e3 0 1").unwrap();
        let before = position.clone();
        let mv = Move::new(Square::D4, Square::E3, crate::chess::core::Piece::None);
        assert!(position.do_move(mv, true));
        assert!(position.piece_at(Square::E4).is_none(), "captured pawn is gone");
        assert!(position.undo_move());
        assert_eq!(position, before);
    }

    #[test]
    fn castling_moves_rook_too() {
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = position.clone();
        let mv = Move::new(Square::E1, Square::G1, crate::chess::core::Piece::None);
        assert!(position.do_move(mv, true));
        assert_eq!(position.piece_at(Square::F1).kind(), crate::chess::core::PieceType::Rook);
        assert!(position.piece_at(Square::H1).is_none());
        assert!(position.undo_move());
        assert_eq!(position, before);
    }

    #[test]
    fn king_in_check_cannot_castle_through_attack() {
        let position = Position::from_fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
        let mv = Move::new(Square::E1, Square::G1, crate::chess::core::Piece::None);
        assert!(!position.clone().do_move(mv, true), "e-file is covered by the rook on e2");
    }

    #[test]
    fn insufficient_material_king_vs_king() {
        let position = Position::from_fen("8/8/4k3/8/8/4K3/8/8 w - - 0 1").unwrap();
        assert!(position.is_insufficient_material());
    }

    #[test]
    fn insufficient_material_false_with_pawns() {
        let position = Position::from_fen("8/8/4k3/8/4P3/4K3/8/8 w - - 0 1").unwrap();
        assert!(!position.is_insufficient_material());
    }

    #[test]
    fn fifty_move_counter_resets_on_capture_and_pawn_move() {
        let mut position = Position::from_fen("8/8/4k3/8/8/4K3/4P3/8 w - - 40 1").unwrap();
        let mv = Move::new(Square::E2, Square::E4, crate::chess::core::Piece::None);
        position.do_move(mv, true);
        assert_eq!(position.half_move_counter(), 0);
    }

    #[test]
    fn on_change_listener_fires_after_do_move() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let mut position = Position::starting();
        let counter = Arc::clone(&calls);
        position.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mv = Move::new(Square::E2, Square::E4, crate::chess::core::Piece::None);
        position.do_move(mv, true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        position.undo_move();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
