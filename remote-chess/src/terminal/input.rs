//! Parsing of typed terminal commands.

use std::path::PathBuf;

use chess::PieceColor;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Anything that is not a keyword is tried as a move.
    Move(String),
    Undo,
    New(Option<String>),
    /// `None` turns the AI off.
    Ai(Option<PieceColor>),
    Retry,
    Cancel,
    Resign,
    Abort,
    Pgn(PathBuf),
    Fen,
    Board,
    History,
    /// Turn the board view around.
    Flip,
    /// Show the position after N plies without touching the live game.
    Goto(usize),
    /// Continue the live game from ply N.
    Rewind(usize),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{command}' does not understand '{value}'")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}

pub const HELP: &str = "\
commands:
  <move>            play a move in coordinate form (e2e4, e7e8q) or SAN (Nf3, O-O)
  undo              take back your last move (and the AI reply)
  new [FEN]         start over, optionally from a position
  ai white|black|off  choose the side the AI plays
  retry             ask the AI again after a failure
  cancel            stop the AI request in flight
  resign | abort    end the game
  pgn PATH          save the game as PGN
  fen | board | history
  flip              turn the board around
  goto N            show the position after N plies
  rewind N          continue the game from ply N
  quit";

/// Parse a line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let rest = (!rest.is_empty()).then_some(rest);

    let command = match word.to_ascii_lowercase().as_str() {
        "undo" | "takeback" => UserCommand::Undo,
        "new" => UserCommand::New(rest.map(str::to_string)),
        "ai" => UserCommand::Ai(parse_side(rest.ok_or(InputError::MissingArgument("ai"))?)?),
        "retry" => UserCommand::Retry,
        "cancel" => UserCommand::Cancel,
        "resign" => UserCommand::Resign,
        "abort" => UserCommand::Abort,
        "pgn" => UserCommand::Pgn(PathBuf::from(
            rest.ok_or(InputError::MissingArgument("pgn"))?,
        )),
        "fen" => UserCommand::Fen,
        "board" => UserCommand::Board,
        "history" | "moves" => UserCommand::History,
        "flip" => UserCommand::Flip,
        "goto" => UserCommand::Goto(parse_ply("goto", rest)?),
        "rewind" => UserCommand::Rewind(parse_ply("rewind", rest)?),
        "help" | "?" => UserCommand::Help,
        "quit" | "exit" | "q" => UserCommand::Quit,
        _ => UserCommand::Move(line.to_string()),
    };
    Ok(Some(command))
}

fn parse_side(value: &str) -> Result<Option<PieceColor>, InputError> {
    match value.to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Some(PieceColor::White)),
        "black" | "b" => Ok(Some(PieceColor::Black)),
        "off" | "none" => Ok(None),
        _ => Err(InputError::InvalidArgument {
            command: "ai",
            value: value.to_string(),
        }),
    }
}

fn parse_ply(command: &'static str, rest: Option<&str>) -> Result<usize, InputError> {
    let value = rest.ok_or(InputError::MissingArgument(command))?;
    value.parse().map_err(|_| InputError::InvalidArgument {
        command,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> UserCommand {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn keywords() {
        assert_eq!(parse("undo"), UserCommand::Undo);
        assert_eq!(parse("  RETRY "), UserCommand::Retry);
        assert_eq!(parse("new"), UserCommand::New(None));
        assert_eq!(
            parse("new 8/8/8/8/8/8/8/K6k w - - 0 1"),
            UserCommand::New(Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()))
        );
        assert_eq!(parse("ai black"), UserCommand::Ai(Some(PieceColor::Black)));
        assert_eq!(parse("ai off"), UserCommand::Ai(None));
        assert_eq!(parse("pgn game.pgn"), UserCommand::Pgn(PathBuf::from("game.pgn")));
        assert_eq!(parse("goto 4"), UserCommand::Goto(4));
        assert_eq!(parse("Flip"), UserCommand::Flip);
        assert_eq!(parse("q"), UserCommand::Quit);
    }

    #[test]
    fn everything_else_is_a_move() {
        assert_eq!(parse("e2e4"), UserCommand::Move("e2e4".to_string()));
        assert_eq!(parse("O-O"), UserCommand::Move("O-O".to_string()));
        assert_eq!(parse("Nf3"), UserCommand::Move("Nf3".to_string()));
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn argument_errors() {
        assert_eq!(parse_command("ai"), Err(InputError::MissingArgument("ai")));
        assert!(matches!(
            parse_command("ai purple"),
            Err(InputError::InvalidArgument { command: "ai", .. })
        ));
        assert!(matches!(
            parse_command("goto -1"),
            Err(InputError::InvalidArgument { command: "goto", .. })
        ));
        assert_eq!(parse_command("pgn"), Err(InputError::MissingArgument("pgn")));
    }
}
