//! Plain-text rendering of boards, status and session events.

use std::fmt::Write;

use ai_client::{Evaluation, Score};
use chess::{BoardState, GamePhase, GameStatus, PieceColor, Square};

use crate::config::FallbackPolicy;
use crate::session::{SessionEvent, SessionSnapshot};

/// Draw `board` with rank and file labels, White at the bottom unless
/// `flipped`. Squares of `highlight` are bracketed.
pub fn render_board(
    board: &BoardState,
    highlight: Option<(Square, Square)>,
    flipped: bool,
) -> String {
    let ranks: Vec<u8> = if flipped {
        (0..8).collect()
    } else {
        (0..8).rev().collect()
    };
    let files: Vec<u8> = if flipped {
        (0..8).rev().collect()
    } else {
        (0..8).collect()
    };

    let mut out = String::new();
    for &rank in &ranks {
        let _ = write!(out, "{} ", rank + 1);
        for &file in &files {
            let Some(sq) = Square::new(file, rank) else {
                continue;
            };
            let glyph = board.piece_at(sq).map_or('.', |p| p.to_fen_char());
            let marked = highlight.is_some_and(|(from, to)| sq == from || sq == to);
            if marked {
                let _ = write!(out, "[{}]", glyph);
            } else {
                let _ = write!(out, " {} ", glyph);
            }
        }
        out.push('\n');
    }
    out.push_str("  ");
    for &file in &files {
        let _ = write!(out, " {} ", (b'a' + file) as char);
    }
    out.push('\n');
    out
}

/// One-line summary of whose turn it is or how the game ended.
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let mut line = match snapshot.phase {
        GamePhase::Terminal(status) => format!("Game over: {}", status),
        GamePhase::AwaitingWhiteMove | GamePhase::AwaitingBlackMove => {
            let side = side_name(snapshot.side_to_move);
            let who = if snapshot.ai_to_move() { " (AI)" } else { "" };
            if snapshot.status == GameStatus::Check {
                format!("{}{} to move, in check", side, who)
            } else {
                format!("{}{} to move", side, who)
            }
        }
    };
    let _ = write!(line, " | ply {}", snapshot.move_count());
    if snapshot.ai_thinking {
        line.push_str(" | AI thinking...");
    } else if let Some(err) = &snapshot.last_ai_error {
        let _ = write!(line, " | last AI error: {}", err);
    }
    line
}

/// Move list in numbered SAN pairs.
pub fn render_history(snapshot: &SessionSnapshot) -> String {
    if snapshot.history.is_empty() {
        return "(no moves)".to_string();
    }
    let mut out = String::new();
    for (i, record) in snapshot.history.iter().enumerate() {
        let ply = i + 1;
        match record.mover {
            PieceColor::White => {
                let _ = write!(out, "{:>3}. {}", ply.div_ceil(2), record.san);
            }
            PieceColor::Black if i == 0 => {
                let _ = writeln!(out, "  1... {}", record.san);
            }
            PieceColor::Black => {
                let _ = writeln!(out, " {}", record.san);
            }
        }
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn side_name(color: PieceColor) -> &'static str {
    match color {
        PieceColor::White => "White",
        PieceColor::Black => "Black",
    }
}

fn format_evaluation(eval: &Evaluation) -> String {
    let mut parts = Vec::new();
    match eval.score {
        Some(Score::Centipawns(cp)) => parts.push(format!("{:+.2}", f64::from(cp) / 100.0)),
        Some(Score::Mate(n)) => parts.push(format!("mate {}", n)),
        None => {}
    }
    if let Some(depth) = eval.depth {
        parts.push(format!("depth {}", depth));
    }
    if let Some(ms) = eval.elapsed_ms {
        parts.push(format!("{} ms", ms));
    }
    parts.join(", ")
}

/// Text for an event that does not redraw the board, if it is worth showing.
pub fn describe_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::StateChanged(_) => None,
        SessionEvent::AiThinking { oracle, .. } => Some(format!("AI ({}) is thinking...", oracle)),
        SessionEvent::AiMoved {
            san,
            oracle,
            evaluation,
            ..
        } => {
            let eval = format_evaluation(evaluation);
            if eval.is_empty() {
                Some(format!("AI ({}) plays {}", oracle, san))
            } else {
                Some(format!("AI ({}) plays {} [{}]", oracle, san, eval))
            }
        }
        SessionEvent::AiFailed { error, fallback } => {
            let next = match fallback {
                FallbackPolicy::Report => "type 'retry' to ask again",
                FallbackPolicy::Local => "the local engine plays this move",
                FallbackPolicy::Forfeit => "the AI side forfeits",
            };
            Some(format!("AI failed: {} ({})", error, next))
        }
        SessionEvent::StaleAiResponse { .. } => None,
        SessionEvent::AiCancelled { .. } => Some("AI request cancelled".to_string()),
        SessionEvent::Error(msg) => Some(format!("error: {}", msg)),
    }
}
