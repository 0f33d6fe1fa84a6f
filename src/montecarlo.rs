//! Monte Carlo move selection.
//!
//! Candidates that capture immediately are resolved without simulation.
//! Every remaining neutral candidate gets an equal share of the simulation
//! budget, and is scored by the average outcome of random playouts from the
//! position after the move:
//! - 1.0 if the player who made the move wins
//! - 0.5 if the playout hit the step cap without a winner
//! - 0.0 if another player wins
//!
//! Playouts end at the first capture: the simulated state requires only one
//! tower per player, whatever the real win condition is.
//!
//! With the `parallel` feature, candidates are simulated on the rayon thread
//! pool. Each candidate draws from its own RNG seeded up front, so results do
//! not depend on the feature.

use fastrand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::constants::{
    MAX_STEPS_TO_SIMULATE, MIN_SIMULATIONS_PER_MOVE, PLAYOUT_INCONCLUSIVE, PLAYOUT_LOSS,
    PLAYOUT_WIN, SIMULATION_TOWERS_TO_WIN, TOTAL_SIMULATIONS,
};
use crate::moves::{BestMoves, Move, SearchError};
use crate::state::GameState;

/// Configuration for the Monte Carlo search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonteCarloConfig {
    /// Playouts shared among all neutral candidates.
    pub total_simulations: usize,
    /// Lower bound on playouts per candidate.
    pub min_simulations_per_move: usize,
    /// Moves after which a playout counts as inconclusive.
    pub max_steps: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            total_simulations: TOTAL_SIMULATIONS,
            min_simulations_per_move: MIN_SIMULATIONS_PER_MOVE,
            max_steps: MAX_STEPS_TO_SIMULATE,
        }
    }
}

impl MonteCarloConfig {
    /// Number of playouts to run for each of `candidates` moves.
    pub fn simulations_per_move(&self, candidates: usize) -> usize {
        (self.total_simulations / candidates.max(1)).max(self.min_simulations_per_move)
    }
}

/// Statistics of the playouts run for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CandidateScore {
    mean: f64,
    capped: usize,
}

/// Find the best among `moves` by simulation.
///
/// Returns every move tied for the highest estimated win probability of the
/// player to move, in the order given, together with that probability. The
/// caller's state is never modified.
pub fn find_best_moves(
    state: &GameState,
    moves: &[Move],
    config: &MonteCarloConfig,
    rng: &mut Rng,
) -> Result<BestMoves<f64>, SearchError> {
    if moves.is_empty() {
        return Err(SearchError::NoCandidateMoves);
    }

    let triage = state.triage_moves(moves);
    if !triage.winning.is_empty() {
        return Ok(BestMoves {
            moves: triage.winning,
            value: PLAYOUT_WIN,
        });
    }
    if triage.neutral.is_empty() {
        return Ok(BestMoves {
            moves: triage.losing,
            value: PLAYOUT_LOSS,
        });
    }

    let work = state.clone_with_towers(Some(SIMULATION_TOWERS_TO_WIN));
    let sims = config.simulations_per_move(triage.neutral.len());
    let seeds: Vec<u64> = triage.neutral.iter().map(|_| rng.u64(..)).collect();

    #[cfg(feature = "parallel")]
    let scores: Vec<CandidateScore> = triage
        .neutral
        .par_iter()
        .zip(seeds.par_iter())
        .map(|(&mv, &seed)| simulate(&work, mv, sims, config.max_steps, seed))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let scores: Vec<CandidateScore> = triage
        .neutral
        .iter()
        .zip(&seeds)
        .map(|(&mv, &seed)| simulate(&work, mv, sims, config.max_steps, seed))
        .collect();

    let mut best_moves = Vec::new();
    let mut best_value = 0.0;
    let mut capped = 0;
    for (&mv, score) in triage.neutral.iter().zip(&scores) {
        trace!(?mv, mean = score.mean, "simulated candidate");
        capped += score.capped;
        if score.mean > best_value {
            best_value = score.mean;
            best_moves.clear();
        }
        if score.mean == best_value {
            best_moves.push(mv);
        }
    }

    if capped > 0 {
        warn!(
            capped,
            max_steps = config.max_steps,
            "playouts reached the step limit; consider raising it"
        );
    }

    Ok(BestMoves {
        moves: best_moves,
        value: best_value,
    })
}

/// Run `sims` playouts after `mv` and average their outcomes for the mover.
fn simulate(work: &GameState, mv: Move, sims: usize, max_steps: usize, seed: u64) -> CandidateScore {
    let mut rng = Rng::with_seed(seed);
    let mover = work.next_player();
    let mut after = work.clone();
    after.apply_move(mv);

    let mut total = 0.0;
    let mut capped = 0;
    for _ in 0..sims {
        let mut sim = after.clone();
        let steps = sim.random_playout(max_steps, &mut rng);
        total += match sim.winner() {
            Some(winner) if winner == mover => PLAYOUT_WIN,
            Some(_) => PLAYOUT_LOSS,
            None => {
                if steps >= max_steps {
                    capped += 1;
                }
                PLAYOUT_INCONCLUSIVE
            }
        };
    }
    CandidateScore {
        mean: if sims > 0 { total / sims as f64 } else { PLAYOUT_INCONCLUSIVE },
        capped,
    }
}
