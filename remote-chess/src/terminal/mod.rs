//! Line-oriented terminal front end for a session.

mod input;
mod render;

use chess::PieceColor;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;

use crate::session::{SessionEvent, SessionHandle, SessionSnapshot};

pub use input::{parse_command, InputError, UserCommand, HELP};
pub use render::{describe_event, render_board, render_history, status_line};

enum Flow {
    Continue,
    Quit,
}

/// Output state: what was last drawn and which way up.
struct View {
    flipped: bool,
    shown_generation: Option<u64>,
    shown_thinking: bool,
}

impl View {
    fn draw(&mut self, snapshot: &SessionSnapshot) -> String {
        self.shown_generation = Some(snapshot.generation);
        self.shown_thinking = snapshot.ai_thinking;
        format!(
            "\n{}{}\n",
            render_board(&snapshot.board, snapshot.last_move, self.flipped),
            status_line(snapshot)
        )
    }

    /// Redraw only when the position or the AI status moved on.
    fn needs_redraw(&self, snapshot: &SessionSnapshot) -> bool {
        self.shown_generation != Some(snapshot.generation)
            || self.shown_thinking != snapshot.ai_thinking
    }
}

/// Drive `handle` from `input` lines, writing the board and messages to `out`.
///
/// Returns on `quit` or end of input.
pub async fn run<R, W>(handle: &SessionHandle, input: R, mut out: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (snapshot, mut events) = handle.subscribe().await?;
    let mut view = View {
        // Sit behind the human's pieces.
        flipped: snapshot.ai_side == Some(PieceColor::White),
        shown_generation: None,
        shown_thinking: false,
    };
    let mut lines = input.lines();

    emit(&mut out, &view.draw(&snapshot)).await?;
    emit(&mut out, "Type 'help' for commands.\n").await?;

    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                match event {
                    Ok(SessionEvent::StateChanged(snapshot)) => {
                        if view.needs_redraw(&snapshot) {
                            let text = view.draw(&snapshot);
                            emit(&mut out, &text).await?;
                        }
                    }
                    Ok(event) => {
                        if let Some(text) = describe_event(&event) {
                            emit(&mut out, &format!("{}\n", text)).await?;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "terminal fell behind session events");
                        let snapshot = handle.get_snapshot().await?;
                        let text = view.draw(&snapshot);
                        emit(&mut out, &text).await?;
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        match execute(handle, command, &mut view, &mut out).await {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Quit) => break,
                            Err(e) => emit(&mut out, &format!("error: {}\n", e)).await?,
                        }
                    }
                    Ok(None) => {}
                    Err(e) => emit(&mut out, &format!("error: {}\n", e)).await?,
                }
            }
        }
    }

    out.flush().await?;
    Ok(())
}

async fn execute<W>(
    handle: &SessionHandle,
    command: UserCommand,
    view: &mut View,
    out: &mut W,
) -> anyhow::Result<Flow>
where
    W: AsyncWrite + Unpin,
{
    tracing::debug!(?command, "terminal command");
    match command {
        UserCommand::Move(text) => {
            handle.play_text(&text).await?;
        }
        UserCommand::Undo => {
            handle.takeback().await?;
        }
        UserCommand::New(fen) => {
            handle.new_game(fen).await?;
        }
        UserCommand::Ai(side) => {
            let snapshot = handle.set_ai_side(side).await?;
            view.flipped = side == Some(PieceColor::White);
            let text = match side {
                Some(color) => format!("AI plays {}\n", color),
                None => "AI off\n".to_string(),
            };
            emit(out, &text).await?;
            let board = view.draw(&snapshot);
            emit(out, &board).await?;
        }
        UserCommand::Retry => {
            handle.request_ai().await?;
        }
        UserCommand::Cancel => {
            if !handle.cancel_ai().await? {
                emit(out, "AI is not thinking\n").await?;
            }
        }
        UserCommand::Resign => {
            let snapshot = handle.get_snapshot().await?;
            let side = snapshot
                .ai_side
                .map_or(snapshot.side_to_move, PieceColor::opposite);
            handle.resign(side).await?;
        }
        UserCommand::Abort => {
            handle.abort().await?;
        }
        UserCommand::Pgn(path) => {
            let pgn = handle.export_pgn().await?;
            tokio::fs::write(&path, pgn).await?;
            tracing::info!(path = %path.display(), "PGN saved");
            emit(out, &format!("Saved PGN to {}\n", path.display())).await?;
        }
        UserCommand::Fen => {
            let snapshot = handle.get_snapshot().await?;
            emit(out, &format!("{}\n", snapshot.fen)).await?;
        }
        UserCommand::Board => {
            let snapshot = handle.get_snapshot().await?;
            let text = view.draw(&snapshot);
            emit(out, &text).await?;
        }
        UserCommand::Flip => {
            view.flipped = !view.flipped;
            let snapshot = handle.get_snapshot().await?;
            let text = view.draw(&snapshot);
            emit(out, &text).await?;
        }
        UserCommand::History => {
            let snapshot = handle.get_snapshot().await?;
            emit(out, &render_history(&snapshot)).await?;
        }
        UserCommand::Goto(ply) => {
            let board = handle.position_at(ply).await?;
            let text = format!(
                "\nPosition after ply {} (the game continues from the live position):\n{}{}\n",
                ply,
                render_board(&board, None, view.flipped),
                chess::format_fen(&board)
            );
            emit(out, &text).await?;
        }
        UserCommand::Rewind(ply) => {
            handle.rewind(ply).await?;
        }
        UserCommand::Help => {
            emit(out, &format!("{}\n", HELP)).await?;
        }
        UserCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn emit<W>(out: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}
