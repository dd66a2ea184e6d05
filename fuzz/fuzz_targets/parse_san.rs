#![no_main]

use caissa::chess::san::{decode, encode};
use caissa::Position;
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as a SAN token against a fixed, move-rich position: decode
// must never panic, and anything it accepts must be a legal move whose own
// canonical encoding decodes back to the same move.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let position =
        Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .expect("fixed fuzz fixture must parse");
    let Ok(mv) = decode(&position, input) else {
        return;
    };
    assert!(position.legal_moves().into_iter().any(|legal| legal == mv));
    let canonical = encode(&position, mv);
    assert_eq!(decode(&position, &canonical).unwrap(), mv);
});
