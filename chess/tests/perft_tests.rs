use chess::{parse_fen, perft, BoardState};

const FULL_PERFT_ENV: &str = "FULL_PERFT";

/// (FEN, [(depth, nodes)]) for the usual move-generator test positions.
const CASES: &[(&str, &[(u32, u64)])] = &[
    (
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[(1, 20), (2, 400), (3, 8_902), (4, 197_281)],
    ),
    (
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[(1, 48), (2, 2_039), (3, 97_862)],
    ),
    (
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        &[(1, 14), (2, 191), (3, 2_812), (4, 43_238)],
    ),
    (
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[(1, 6), (2, 264), (3, 9_467)],
    ),
    (
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        &[(1, 44), (2, 1_486), (3, 62_379)],
    ),
    (
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        &[(1, 46), (2, 2_079), (3, 89_890)],
    ),
];

/// Deeper counts, only run with `FULL_PERFT=1`.
const DEEP_CASES: &[(&str, u32, u64)] = &[
    (
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        5,
        4_865_609,
    ),
    (
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        4,
        4_085_603,
    ),
    ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5, 674_624),
];

#[test]
fn perft_standard_positions() {
    for (fen, depths) in CASES {
        let state = parse_fen(fen).unwrap_or_else(|e| panic!("bad FEN '{}': {}", fen, e));
        for (depth, expected) in depths.iter() {
            let got = perft(&state, *depth);
            assert_eq!(
                got, *expected,
                "Perft mismatch for FEN '{}' at depth {}",
                fen, depth
            );
        }
    }
}

#[test]
fn perft_deep_positions() {
    if std::env::var(FULL_PERFT_ENV).is_err() {
        eprintln!("Skipping deep perft - set {}=1 to run.", FULL_PERFT_ENV);
        return;
    }
    for (fen, depth, expected) in DEEP_CASES {
        let state = parse_fen(fen).unwrap();
        assert_eq!(perft(&state, *depth), *expected, "FEN '{}'", fen);
    }
}

#[test]
fn initial_state_matches_starting_fen() {
    assert_eq!(
        parse_fen(chess::STARTING_FEN).unwrap(),
        BoardState::initial()
    );
}
