//! PGN export.

use crate::fen::STARTING_FEN;
use crate::game::Game;
use crate::rules::GameStatus;
use crate::types::PieceColor;

const LINE_WIDTH: usize = 80;

/// Header tags written ahead of the movetext. Unknown values use the PGN
/// placeholders (`?`, `????.??.??`).
#[derive(Debug, Clone)]
pub struct PgnTags {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

impl Default for PgnTags {
    fn default() -> Self {
        Self {
            event: "?".to_string(),
            site: "?".to_string(),
            date: "????.??.??".to_string(),
            round: "?".to_string(),
            white: "?".to_string(),
            black: "?".to_string(),
        }
    }
}

/// Result token for the game's status.
pub fn result_token(status: GameStatus) -> &'static str {
    match status.winner() {
        Some(PieceColor::White) => "1-0",
        Some(PieceColor::Black) => "0-1",
        None if status.is_draw() => "1/2-1/2",
        None => "*",
    }
}

pub fn format_pgn(game: &Game, tags: &PgnTags) -> String {
    let result = result_token(game.status());
    let mut out = String::new();
    for (name, value) in [
        ("Event", tags.event.as_str()),
        ("Site", tags.site.as_str()),
        ("Date", tags.date.as_str()),
        ("Round", tags.round.as_str()),
        ("White", tags.white.as_str()),
        ("Black", tags.black.as_str()),
        ("Result", result),
    ] {
        push_tag(&mut out, name, value);
    }
    if game.start_fen() != STARTING_FEN {
        push_tag(&mut out, "SetUp", "1");
        push_tag(&mut out, "FEN", game.start_fen());
    }
    out.push('\n');

    let mut tokens = Vec::with_capacity(game.history().len() * 3 / 2 + 1);
    let start = game.position_at(0);
    let mut move_number = start.map_or(1, |s| s.fullmove_number());
    for (i, entry) in game.history().iter().enumerate() {
        match entry.mover {
            PieceColor::White => tokens.push(format!("{}.", move_number)),
            PieceColor::Black if i == 0 => tokens.push(format!("{}...", move_number)),
            PieceColor::Black => {}
        }
        tokens.push(entry.san.clone());
        if entry.mover == PieceColor::Black {
            move_number += 1;
        }
    }
    tokens.push(result.to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}

fn push_tag(out: &mut String, name: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    out.push_str(&format!("[{} \"{}\"]\n", name, escaped));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_uci;

    fn play(game: &mut Game, moves: &[&str]) {
        for text in moves {
            game.apply_move(&parse_uci(text).unwrap()).unwrap();
        }
    }

    #[test]
    fn exports_fools_mate() {
        let mut game = Game::new();
        play(&mut game, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let tags = PgnTags {
            white: "Human".to_string(),
            black: "Remote".to_string(),
            ..PgnTags::default()
        };
        let pgn = game.to_pgn(&tags);
        assert!(pgn.contains("[White \"Human\"]\n"));
        assert!(pgn.contains("[Result \"0-1\"]\n"));
        assert!(!pgn.contains("SetUp"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1\n"));
    }

    #[test]
    fn custom_start_writes_fen_and_black_first_move() {
        let fen = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 12";
        let mut game = Game::from_fen(fen).unwrap();
        play(&mut game, &["e8d7", "e2e4"]);
        let pgn = game.to_pgn(&PgnTags::default());
        assert!(pgn.contains("[SetUp \"1\"]\n"));
        assert!(pgn.contains(&format!("[FEN \"{}\"]\n", fen)));
        assert!(pgn.ends_with("12... Kd7 13. e4 *\n"));
    }

    #[test]
    fn result_tokens() {
        assert_eq!(result_token(GameStatus::Ongoing), "*");
        assert_eq!(result_token(GameStatus::Aborted), "*");
        assert_eq!(result_token(GameStatus::Stalemate), "1/2-1/2");
        assert_eq!(
            result_token(GameStatus::Resigned {
                winner: PieceColor::White
            }),
            "1-0"
        );
    }

    #[test]
    fn long_games_wrap() {
        let mut game = Game::new();
        play(&mut game, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        play(&mut game, &["e2e4", "e7e5", "d2d4", "d7d5", "c2c4", "c7c5", "b2b3", "b7b6"]);
        play(&mut game, &["a2a3", "a7a6", "h2h3", "h7h6", "g2g3", "g7g6", "f2f3", "f7f6"]);
        let pgn = game.to_pgn(&PgnTags::default());
        let movetext = pgn.split("\n\n").nth(1).unwrap();
        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|line| line.len() <= LINE_WIDTH));
    }
}
