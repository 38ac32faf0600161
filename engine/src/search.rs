//! Negamax search with alpha-beta pruning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chess::rules::is_insufficient_material;
use chess::{generate_legal_moves, BoardState, Move, PositionKey};

use crate::eval::{evaluate, MATE_SCORE};

const INFINITY: i32 = MATE_SCORE * 2;

/// When to give up on a search.
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits<'a> {
    pub depth: u8,
    pub deadline: Option<Instant>,
    pub stop: Option<&'a AtomicBool>,
}

impl SearchLimits<'_> {
    pub fn depth(depth: u8) -> Self {
        SearchLimits {
            depth,
            deadline: None,
            stop: None,
        }
    }

    fn expired(&self) -> bool {
        self.stop.is_some_and(|flag| flag.load(Ordering::Relaxed))
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Best root move found by [`pick_best_move`].
pub struct SearchOutcome {
    pub best_move: Option<(Move, i32)>,
    pub nodes: u64,
    /// True if the limits cut the search short.
    pub stopped: bool,
}

struct Searcher<'a> {
    limits: SearchLimits<'a>,
    nodes: u64,
    stopped: bool,
}

/// Searches `state` to `limits.depth` plies.
///
/// `history` holds the position keys of the game so far, ending with the
/// key of `state`; it is used for repetition draws inside the tree.
pub fn pick_best_move(
    state: &BoardState,
    history: &[PositionKey],
    limits: SearchLimits<'_>,
) -> SearchOutcome {
    let mut searcher = Searcher {
        limits,
        nodes: 0,
        stopped: false,
    };
    let mut moves = generate_legal_moves(state);
    order_moves(&mut moves);

    let mut path: Vec<PositionKey> = history.to_vec();
    let mut best: Option<(Move, i32)> = None;
    let mut alpha = -INFINITY;
    let depth = limits.depth.max(1);

    for mv in moves {
        // Always finish the first root move so there is something to play.
        if best.is_some() && searcher.limits.expired() {
            searcher.stopped = true;
            break;
        }
        let next = state.successor(&mv);
        path.push(next.key());
        let score = -searcher.negamax(&next, depth - 1, 1, -INFINITY, -alpha, &mut path);
        path.pop();

        if searcher.stopped && best.is_some() {
            break;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((mv, score));
        }
        alpha = alpha.max(score);
    }

    SearchOutcome {
        best_move: best,
        nodes: searcher.nodes,
        stopped: searcher.stopped,
    }
}

impl Searcher<'_> {
    fn negamax(
        &mut self,
        state: &BoardState,
        depth: u8,
        ply: i32,
        mut alpha: i32,
        beta: i32,
        path: &mut Vec<PositionKey>,
    ) -> i32 {
        self.nodes += 1;
        if self.nodes % 1024 == 0 && self.limits.expired() {
            self.stopped = true;
        }
        if self.stopped {
            return 0;
        }

        let mut moves = generate_legal_moves(state);
        if moves.is_empty() {
            return if state.is_check() {
                -MATE_SCORE + ply
            } else {
                0
            };
        }
        if state.halfmove_clock() >= 100 || is_insufficient_material(state) {
            return 0;
        }
        if let Some(key) = path.last() {
            if path.iter().filter(|k| *k == key).count() >= 3 {
                return 0;
            }
        }
        if depth == 0 {
            return evaluate(state, moves.len());
        }

        order_moves(&mut moves);
        let mut best = -INFINITY;
        for mv in moves {
            let next = state.successor(&mv);
            path.push(next.key());
            let score = -self.negamax(&next, depth - 1, ply + 1, -beta, -alpha, path);
            path.pop();

            best = best.max(score);
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

/// Captures first, otherwise generation order.
fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|mv| !mv.is_capture());
}
