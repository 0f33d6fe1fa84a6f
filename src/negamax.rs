//! Negamax search with alpha-beta pruning.
//!
//! Fixed-depth adversarial search for two-player games. Leaves are scored by
//! [`GameState::evaluate`]; decided games are adjusted by the remaining depth
//! so that quicker wins score higher and quicker losses score lower.
//!
//! The search mutates a single state in place through paired
//! `apply_move`/`undo_move` calls, so it must run on one thread.
//!
//! Possible improvements:
//! - move ordering by a shallow search
//! - generating moves incrementally to save work on beta cutoffs
//! - a transposition table

use tracing::debug;

use crate::constants::SEARCH_DEPTH;
use crate::moves::{BestMoves, Move, SearchError};
use crate::state::GameState;

/// Configuration for the negamax search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegamaxConfig {
    /// Search depth in plies, counting the root move. Higher is stronger but
    /// slower. A depth of 0 behaves like 1.
    pub depth: u32,
}

impl Default for NegamaxConfig {
    fn default() -> Self {
        Self {
            depth: SEARCH_DEPTH,
        }
    }
}

/// Find the best among `moves`, which need not be every legal move in
/// `state` (the caller may have filtered them).
///
/// Returns every move tied for the best value, in the order given, together
/// with that value from the point of view of the player to move. The state is
/// restored before returning.
pub fn find_best_moves(
    state: &mut GameState,
    moves: &[Move],
    config: &NegamaxConfig,
) -> Result<BestMoves<i64>, SearchError> {
    if state.player_count() != 2 {
        return Err(SearchError::UnsupportedPlayerCount(state.player_count()));
    }
    if moves.is_empty() {
        return Err(SearchError::NoCandidateMoves);
    }

    let depth_left = config.depth.saturating_sub(1);
    let mut best_moves = Vec::new();
    let mut best_value = -i64::MAX;
    for &mv in moves {
        let undo = state.apply_move(mv);
        // Anything worse than the current best only needs an upper bound.
        let beta = best_value.saturating_neg().saturating_add(1);
        let value = -search(state, depth_left, -i64::MAX, beta);
        state.undo_move(mv, undo);
        if value > best_value {
            best_value = value;
            best_moves.clear();
        }
        if value == best_value {
            best_moves.push(mv);
        }
    }

    debug!(
        candidates = moves.len(),
        best = best_moves.len(),
        value = best_value,
        depth = config.depth,
        "negamax search finished"
    );
    Ok(BestMoves {
        moves: best_moves,
        value: best_value,
    })
}

/// Value of `state` for the player to move, searched `depth_left` plies deep
/// within the window `(alpha, beta)`.
fn search(state: &mut GameState, depth_left: u32, mut alpha: i64, beta: i64) -> i64 {
    if depth_left == 0 {
        return state.evaluate();
    }
    let moves = state.generate_moves();
    if moves.is_empty() {
        // Game over. Prefer quicker wins and slower losses.
        let value = state.evaluate();
        return match value.signum() {
            1 => value + depth_left as i64,
            -1 => value - depth_left as i64,
            _ => value,
        };
    }

    let mut best_value = -i64::MAX;
    for mv in moves {
        let undo = state.apply_move(mv);
        let value = -search(state, depth_left - 1, -beta, -alpha);
        state.undo_move(mv, undo);
        if value > best_value {
            best_value = value;
            alpha = alpha.max(value);
            if value >= beta {
                break;
            }
        }
    }
    best_value
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::constants::WIN_SCORE;
    use crate::geometry::{BoardConfig, BoardGeometry};

    fn strip() -> Arc<BoardGeometry> {
        let config = BoardConfig {
            rows: 1,
            cols: 4,
            padding_size: 0,
            winning_height: 2,
            ..BoardConfig::default()
        };
        Arc::new(BoardGeometry::build(config, "....").unwrap())
    }

    #[test]
    fn test_win_in_one() {
        let mut state = GameState::new(strip());
        state.apply_move(Move::Place { dst: 0 });
        state.apply_move(Move::Place { dst: 1 });
        let before = state.clone();

        let moves = state.generate_moves();
        let result = find_best_moves(&mut state, &moves, &NegamaxConfig::default()).unwrap();
        assert_eq!(result.moves, vec![Move::Shift { src: 0, count: 1, dst: 1 }]);
        // Decided after one ply, with three plies of depth to spare.
        assert_eq!(result.value, WIN_SCORE + 3);
        assert_eq!(state, before);
    }

    #[test]
    fn test_depth_one_is_static() {
        let mut state = GameState::new(strip());
        state.apply_move(Move::Place { dst: 0 });
        let moves = state.generate_moves();
        let config = NegamaxConfig { depth: 1 };
        let result = find_best_moves(&mut state, &moves, &config).unwrap();

        let mut expected = -i64::MAX;
        for &mv in &moves {
            let undo = state.apply_move(mv);
            expected = expected.max(-state.evaluate());
            state.undo_move(mv, undo);
        }
        assert_eq!(result.value, expected);
        assert!(!result.moves.is_empty());
    }

    #[test]
    fn test_depth_zero_behaves_like_one() {
        let mut state = GameState::new(strip());
        let moves = state.generate_moves();
        let a = find_best_moves(&mut state, &moves, &NegamaxConfig { depth: 0 }).unwrap();
        let b = find_best_moves(&mut state, &moves, &NegamaxConfig { depth: 1 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_errors() {
        let mut state = GameState::new(strip());
        assert_eq!(
            find_best_moves(&mut state, &[], &NegamaxConfig::default()),
            Err(SearchError::NoCandidateMoves)
        );

        let geo = Arc::new(BoardGeometry::standard(3).unwrap());
        let mut state = GameState::new(geo);
        let moves = state.generate_moves();
        assert_eq!(
            find_best_moves(&mut state, &moves, &NegamaxConfig::default()),
            Err(SearchError::UnsupportedPlayerCount(3))
        );
    }
}
