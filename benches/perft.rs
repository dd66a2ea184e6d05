//! Criterion benchmarks measuring move-generation throughput via perft: the
//! same workload used as a correctness test in `tests/move_generation.rs`,
//! run here at the depths that actually stress the generator.

use caissa::chess::movegen::perft;
use caissa::Position;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// This acts both as a performance and a correctness benchmark: `nodes` is the
// known-correct leaf count for each position, see
// https://www.chessprogramming.org/Perft_Results.
fn perft_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    for (name, fen, depth, nodes) in [
        ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 5, 4_865_609),
        (
            "kiwipete",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            4,
            4_085_603,
        ),
        ("endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5, 674_624),
    ] {
        let position = Position::from_fen(fen).unwrap();
        group.throughput(Throughput::Elements(nodes));
        group.bench_with_input(
            BenchmarkId::new("perft", format!("{name}, depth {depth}, nodes {nodes}")),
            &depth,
            |b, &depth| {
                b.iter(|| assert_eq!(perft(&position, depth), nodes));
            },
        );
    }
    group.finish();
}

criterion_group! {
    name = perft;
    config = Criterion::default().sample_size(10);
    targets = perft_bench
}

criterion_main!(perft);
