//! Automated games between agents.
//!
//! Used by the command line tool and as a sanity check for the searches: a
//! stronger agent should reliably beat one that plays at random.

use std::fmt;

use fastrand::Rng;
use tracing::debug;

use crate::montecarlo::{self, MonteCarloConfig};
use crate::moves::{Move, Player, SearchError};
use crate::negamax::{self, NegamaxConfig};
use crate::state::GameState;

/// A move selection strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Agent {
    /// Plays a uniformly random legal move.
    Dummy,
    /// Negamax search; two players only.
    Negamax(NegamaxConfig),
    /// Monte Carlo simulation.
    MonteCarlo(MonteCarloConfig),
}

impl Agent {
    /// Choose a move for the player to move in `state`, breaking ties among
    /// equally good moves uniformly at random.
    ///
    /// Returns `Ok(None)` if the game is already over.
    pub fn choose_move(
        &self,
        state: &mut GameState,
        rng: &mut Rng,
    ) -> Result<Option<Move>, SearchError> {
        let moves = state.generate_moves();
        if moves.is_empty() {
            return Ok(None);
        }
        let candidates = match self {
            Agent::Dummy => moves,
            Agent::Negamax(config) => negamax::find_best_moves(state, &moves, config)?.moves,
            Agent::MonteCarlo(config) => {
                montecarlo::find_best_moves(state, &moves, config, rng)?.moves
            }
        };
        if candidates.is_empty() {
            return Err(SearchError::NoCandidateMoves);
        }
        Ok(Some(candidates[rng.usize(..candidates.len())]))
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agent::Dummy => write!(f, "dummy"),
            Agent::Negamax(config) => write!(f, "negamax(depth={})", config.depth),
            Agent::MonteCarlo(config) => {
                write!(f, "montecarlo(sims={})", config.total_simulations)
            }
        }
    }
}

/// How a self-play game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// A player captured the required number of towers.
    Won(Player),
    /// Every player passed in a row, so the game can never progress.
    PassCycle,
    /// The game was cut off after the maximum number of moves.
    MoveLimit,
}

/// Play `state` to the end, with `agents[p]` choosing the moves of player `p`.
///
/// Returns the outcome and the moves played, in order.
pub fn play_game(
    state: &mut GameState,
    agents: &[Agent],
    max_moves: usize,
    rng: &mut Rng,
) -> Result<(GameOutcome, Vec<Move>), SearchError> {
    if agents.len() != state.player_count() {
        return Err(SearchError::UnsupportedPlayerCount(agents.len()));
    }

    let mut history = Vec::new();
    let mut passes = 0;
    while history.len() < max_moves {
        let player = state.next_player();
        let agent = &agents[player as usize];
        let Some(mv) = agent.choose_move(state, rng)? else {
            break;
        };
        debug!(player, %agent, ?mv, "self-play move");
        state.apply_move(mv);
        history.push(mv);

        if mv == Move::Pass {
            passes += 1;
            if passes == state.player_count() {
                return Ok((GameOutcome::PassCycle, history));
            }
        } else {
            passes = 0;
        }
    }

    let outcome = match state.winner() {
        Some(winner) => GameOutcome::Won(winner),
        None => GameOutcome::MoveLimit,
    };
    Ok((outcome, history))
}
