//! Random playouts (game simulation).
//!
//! A playout plays heuristically biased random moves until the game is
//! decided or a step cap is reached. The policy is simple: play a winning
//! move if one exists, avoid immediately losing moves when possible, and
//! otherwise pick uniformly among the neutral moves.
//!
//! Randomness comes from a caller-supplied [`fastrand::Rng`], so playouts are
//! reproducible from a seed.

use fastrand::Rng;

use crate::moves::Move;
use crate::state::GameState;

impl GameState {
    /// Play one move chosen by the playout policy.
    ///
    /// Returns the move played, or `None` if the game is already over.
    pub fn play_random_move(&mut self, rng: &mut Rng) -> Option<Move> {
        let moves = self.generate_moves();
        let triage = self.triage_moves(&moves);
        // Pass is neutral, so some group is nonempty unless the game is over.
        let group = [triage.winning, triage.neutral, triage.losing]
            .into_iter()
            .find(|group| !group.is_empty())?;
        let mv = group[rng.usize(..group.len())];
        self.apply_move(mv);
        Some(mv)
    }

    /// Simulate a random playout of at most `max_steps` moves.
    ///
    /// Returns the number of moves played. Reaching `max_steps` means the
    /// playout was inconclusive unless a winner happens to exist.
    pub fn random_playout(&mut self, max_steps: usize, rng: &mut Rng) -> usize {
        for step in 0..max_steps {
            if self.play_random_move(rng).is_none() {
                return step;
            }
        }
        max_steps
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::{BoardConfig, BoardGeometry};

    fn standard() -> Arc<BoardGeometry> {
        Arc::new(BoardGeometry::standard(2).unwrap())
    }

    #[test]
    fn test_playout_step_cap() {
        let mut rng = Rng::with_seed(7);
        let mut state = GameState::new(standard());

        let steps = state.random_playout(3, &mut rng);
        assert_eq!(steps, 3);
        assert_eq!(state.next_player(), 1);
        assert_eq!(state.winner(), None);

        // Statistically virtually guaranteed to finish.
        let steps = state.random_playout(1000, &mut rng);
        assert!((6..1000).contains(&steps), "steps = {steps}");
        assert!(state.winner().is_some());
    }

    #[test]
    fn test_playout_on_finished_game() {
        let mut rng = Rng::with_seed(1);
        let mut state = GameState::with_counts(standard(), 20, 0);
        assert_eq!(state.random_playout(10, &mut rng), 0);
        assert_eq!(state.play_random_move(&mut rng), None);
    }

    #[test]
    fn test_playout_is_reproducible() {
        let base = GameState::new(standard());
        let mut a = base.clone();
        let mut b = base.clone();
        let steps_a = a.random_playout(250, &mut Rng::with_seed(42));
        let steps_b = b.random_playout(250, &mut Rng::with_seed(42));
        assert_eq!(steps_a, steps_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_move_takes_win() {
        // On a 1x3 strip with capture height 2, player 0 can capture at once.
        let config = BoardConfig {
            rows: 1,
            cols: 3,
            padding_size: 0,
            winning_height: 2,
            ..BoardConfig::default()
        };
        let geo = Arc::new(BoardGeometry::build(config, "...").unwrap());
        let mut state = GameState::new(geo);
        state.apply_move(Move::Place { dst: 0 });
        state.apply_move(Move::Place { dst: 1 });

        for seed in 0..20 {
            let mut copy = state.clone();
            let mv = copy.play_random_move(&mut Rng::with_seed(seed));
            assert_eq!(mv, Some(Move::Shift { src: 0, count: 1, dst: 1 }));
            assert_eq!(copy.winner(), Some(0));
        }
    }

    #[test]
    fn test_random_move_avoids_loss() {
        // Player 1 to move. Every shift completes a tower for player 0, so
        // the only neutral move is the placement.
        let config = BoardConfig {
            rows: 1,
            cols: 4,
            padding_size: 0,
            winning_height: 2,
            ..BoardConfig::default()
        };
        let geo = Arc::new(BoardGeometry::build(config, "....").unwrap());
        let mut state = GameState::new(geo);
        state.apply_move(Move::Place { dst: 0 });
        state.apply_move(Move::Place { dst: 3 });
        state.apply_move(Move::Place { dst: 1 });
        // Fields: [0] [0] . [1]. Both shifts credit player 0.
        for seed in 0..20 {
            let mut copy = state.clone();
            let mv = copy.play_random_move(&mut Rng::with_seed(seed));
            assert_eq!(mv, Some(Move::Place { dst: 2 }));
        }
    }
}
