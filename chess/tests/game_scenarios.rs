use chess::{
    format_fen, parse_uci, Game, GameError, GamePhase, GameStatus, IllegalReason, Move,
    PieceColor, PieceKind, Square,
};

fn uci(text: &str) -> Move {
    parse_uci(text).unwrap()
}

fn play(game: &mut Game, moves: &[&str]) {
    for text in moves {
        game.apply_move(&uci(text))
            .unwrap_or_else(|e| panic!("{} rejected: {}", text, e));
    }
}

fn reason_of(err: GameError) -> IllegalReason {
    match err {
        GameError::IllegalMove(e) => e.reason,
        other => panic!("expected an illegal move, got {:?}", other),
    }
}

#[test]
fn opening_pawn_push() {
    let mut game = Game::new();
    play(&mut game, &["e2e4"]);

    let state = game.current_state();
    let e4: Square = "e4".parse().unwrap();
    let e2: Square = "e2".parse().unwrap();
    assert_eq!(state.piece_at(e4).map(|p| p.kind), Some(PieceKind::Pawn));
    assert_eq!(state.piece_at(e2), None);
    assert_eq!(state.side_to_move(), PieceColor::Black);
    assert_eq!(state.en_passant(), None);
    assert_eq!(game.phase(), GamePhase::AwaitingBlackMove);
    assert_eq!(
        format_fen(&state),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
}

#[test]
fn fools_mate_then_session_terminated() {
    let mut game = Game::new();
    play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
    assert_eq!(
        game.status(),
        GameStatus::Checkmate {
            winner: PieceColor::Black
        }
    );
    assert!(game.phase().is_terminal());

    let generation = game.generation();
    let err = game.apply_move(&uci("a2a3")).unwrap_err();
    assert!(matches!(err, GameError::SessionTerminated(_)));
    assert_eq!(game.generation(), generation);
    assert_eq!(game.history().len(), 4);
}

#[test]
fn threefold_repetition_on_third_occurrence() {
    let mut game = Game::new();
    play(
        &mut game,
        &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"],
    );
    assert_eq!(game.status(), GameStatus::Ongoing);
    play(&mut game, &["f6g8"]);
    assert_eq!(game.status(), GameStatus::DrawRepetition);
}

#[test]
fn fifty_move_rule() {
    let mut game = Game::from_fen("4k3/8/8/8/8/8/R7/4K3 w - - 99 80").unwrap();
    assert_eq!(game.status(), GameStatus::Ongoing);
    play(&mut game, &["a2a3"]);
    assert_eq!(game.status(), GameStatus::DrawFiftyMove);
}

#[test]
fn promotion_requires_a_kind() {
    let mut game = Game::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let err = game.apply_move(&uci("a7a8")).unwrap_err();
    assert_eq!(reason_of(err), IllegalReason::MalformedPromotion);

    let entry = game.apply_move(&uci("a7a8n")).unwrap();
    assert_eq!(entry.san, "a8=N");
    let a8: Square = "a8".parse().unwrap();
    assert_eq!(
        game.current_state().piece_at(a8).map(|p| p.kind),
        Some(PieceKind::Knight)
    );
}

#[test]
fn castling_through_check_is_rejected() {
    let mut game = Game::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let err = game.apply_move(&uci("e1g1")).unwrap_err();
    assert_eq!(reason_of(err), IllegalReason::ExposesKing);

    let entry = game.apply_move(&uci("e1c1")).unwrap();
    assert!(entry.mv.is_castle());
    assert_eq!(entry.san, "O-O-O");
    let d1: Square = "d1".parse().unwrap();
    assert_eq!(
        game.current_state().piece_at(d1).map(|p| p.kind),
        Some(PieceKind::Rook)
    );
}

#[test]
fn moving_out_of_turn() {
    let mut game = Game::new();
    let err = game.apply_move(&uci("e7e5")).unwrap_err();
    assert_eq!(reason_of(err), IllegalReason::OutOfTurn);
    assert_eq!(game.generation(), 0);
}

#[test]
fn huge_move_counters_load_and_play() {
    let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295").unwrap();
    play(&mut game, &["e8d7"]);
    assert_eq!(game.current_state().fullmove_number(), u32::MAX);
}

#[test]
fn castling_right_without_its_rook_is_dropped() {
    let mut game = Game::from_fen("4k3/p7/8/8/8/8/P7/4K3 w K - 0 1").unwrap();
    assert_eq!(format_fen(&game.current_state()), "4k3/p7/8/8/8/8/P7/4K3 w - - 0 1");
    let err = game.apply_move(&uci("e1g1")).unwrap_err();
    assert_eq!(reason_of(err), IllegalReason::NoCastlingRights);
}
