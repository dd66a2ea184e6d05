//! FEN round-tripping: parsing a valid FEN and re-serializing it should
//! reproduce the same (sanitized) string, and malformed input should be
//! rejected rather than silently accepted.

use caissa::Position;
use pretty_assertions::assert_eq;

fn expect_round_trip(fen: &str) {
    let position = Position::from_fen(fen).unwrap_or_else(|err| panic!("parsing {fen:?}: {err}"));
    assert_eq!(position.to_fen(), fen);
}

#[test]
fn starting_position_round_trips() {
    expect_round_trip("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn middlegame_positions_round_trip() {
    expect_round_trip("2r3r1/p3k3/1p3pp1/1B5p/5P2/2P1p1P1/PP4KP/3R4 w - - 0 34");
    expect_round_trip("rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7");
    expect_round_trip("r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7");
    expect_round_trip("r1b1qrk1/ppp2pbp/n2p1np1/4p1B1/2PPP3/2NB1N1P/PP3PP1/R2QK2R w KQ e6 0 9");
}

#[test]
fn missing_counters_default_to_zero_and_one() {
    let position =
        Position::from_fen("rnbqkb1r/pp2pppp/3p1n2/8/3NP3/2N5/PPP2PPP/R1BQKB1R b KQkq -").unwrap();
    assert_eq!(
        position.to_fen(),
        "rnbqkb1r/pp2pppp/3p1n2/8/3NP3/2N5/PPP2PPP/R1BQKB1R b KQkq - 0 1"
    );
}

#[test]
fn rejects_missing_king() {
    let err = Position::from_fen("3k4/8/8/8/8/8/8/8 w - - 0 1").unwrap_err();
    assert!(err.to_string().contains("White king"), "{err}");
}

#[test]
fn rejects_extra_king() {
    let err = Position::from_fen("1kkk4/8/8/8/8/8/8/1KKK4 w - - 0 1").unwrap_err();
    assert!(err.to_string().contains("White king"), "{err}");
}

#[test]
fn rejects_rank_with_wrong_file_count() {
    assert!(Position::from_fen("rnbqkbnr/pppppppp/7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    assert!(Position::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
}

#[test]
fn rejects_wrong_rank_count() {
    assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
}

#[test]
fn rejects_unknown_piece_symbol() {
    assert!(Position::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
}

#[test]
fn en_passant_square_is_not_advertised_when_the_capture_would_expose_the_king() {
    // e5xd6 would remove both the e5 and d5 pawns, opening rank 5 between
    // the white king on a5 and the black rook on h5.
    let position = Position::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
    assert_eq!(position.to_fen(), "8/8/8/K2pP2r/8/8/8/4k3 w - - 0 1");
}

#[test]
fn parse_error_carries_the_offending_fen() {
    let fen = "3k4/8/8/8/8/8/8/8 w - - 0 1";
    let err = Position::from_fen(fen).unwrap_err();
    assert!(err.to_string().contains(fen), "{err}");
}
