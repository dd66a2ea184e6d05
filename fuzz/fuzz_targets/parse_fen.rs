#![no_main]

use caissa::chess::movegen::perft;
use caissa::Position;
use itertools::Itertools;
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;
use shakmaty::{CastlingMode, Chess, Position as ShakmatyPosition};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(position) = Position::from_fen(input) else {
        return;
    };
    let Ok(shakmaty_setup) = input.parse::<shakmaty::fen::Fen>() else {
        // We accepted a FEN shakmaty rejects outright: nothing further to
        // cross-check, but parsing itself must not have panicked.
        return;
    };
    let Ok(shakmaty_position) = shakmaty_setup.into_position::<Chess>(CastlingMode::Standard)
    else {
        return;
    };
    assert_eq!(
        position
            .legal_moves()
            .into_iter()
            .map(|m| m.to_uci())
            .sorted()
            .collect::<Vec<_>>(),
        shakmaty_position
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard).to_string())
            .sorted()
            .collect::<Vec<_>>(),
        "legal moves diverge from the shakmaty oracle for {input:?}"
    );
    // perft(1) should equal the legal move count; cheap extra sanity check
    // that do_move/undo_move round-trip without corrupting the position.
    assert_eq!(perft(&position, 1), position.legal_moves().len() as u64);
});
