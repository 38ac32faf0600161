//! remote-chess command line.
//!
//! `play` runs a terminal game in which one side can be played by a remote
//! AI service (or the built-in engine when no `AI_URL` is configured).
//! `perft` counts move-generator leaf nodes for a position.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chess::{parse_fen, perft_divide, Game, PieceColor, STARTING_FEN};
use clap::{Parser, Subcommand, ValueEnum};
use remote_chess::{build_oracle, spawn_session, terminal, AppConfig, SessionOptions};
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "remote-chess", about = "Terminal chess against a remote AI service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game in the terminal.
    Play {
        /// JSON config file (default: configs/config.json if present).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Side played by the AI.
        #[arg(long, value_enum, default_value_t = AiSide::Black)]
        ai_side: AiSide,
        /// Start from this position instead of the initial one.
        #[arg(long)]
        fen: Option<String>,
    },
    /// Count leaf nodes of the move tree, split by root move.
    Perft {
        #[arg(long)]
        depth: u32,
        #[arg(long, default_value = STARTING_FEN)]
        fen: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AiSide {
    White,
    Black,
    None,
}

impl AiSide {
    fn color(self) -> Option<PieceColor> {
        match self {
            Self::White => Some(PieceColor::White),
            Self::Black => Some(PieceColor::Black),
            Self::None => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Play {
            config,
            ai_side,
            fen,
        } => play(config.as_deref(), ai_side.color(), fen).await,
        Commands::Perft { depth, fen } => perft(depth, &fen),
    }
}

async fn play(
    config_path: Option<&Path>,
    ai_side: Option<PieceColor>,
    fen: Option<String>,
) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path).context("loading configuration")?;

    // Logs go to a file so they never interleave with the board.
    prepare_log_dir(&config.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "remote-chess");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        ai_url = config.ai_url.as_deref().unwrap_or("<local engine>"),
        think_ms = config.think.as_millis() as u64,
        fallback = ?config.fallback,
        "remote-chess starting up"
    );

    let game = match fen.as_deref() {
        Some(fen) => Game::from_fen(fen).context("invalid --fen")?,
        None => Game::new(),
    };
    let options = SessionOptions::from_config(&config, ai_side);
    let oracle =
        build_oracle(&config, options.local_oracle.clone()).context("configuring the AI client")?;
    let handle = spawn_session(game, oracle, options);

    let result = terminal::run(
        &handle,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    handle.shutdown().await;
    tracing::info!("remote-chess exiting");
    result
}

fn prepare_log_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))
}

fn perft(depth: u32, fen: &str) -> anyhow::Result<()> {
    let state = parse_fen(fen).context("invalid --fen")?;
    let divide = perft_divide(&state, depth);
    let mut total = 0u64;
    for (mv, nodes) in &divide {
        println!("{}: {}", mv, nodes);
        total += nodes;
    }
    println!();
    println!("Nodes searched: {}", total);
    Ok(())
}
