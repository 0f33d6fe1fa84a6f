//! Mixtour-Engine: move selection for Mixtour-style stacking games.
//!
//! Players place pieces on a small board and move the tops of stacks onto
//! other stacks. A stack that reaches the winning height is captured by the
//! owner of its top piece; capturing enough stacks wins the game. Board
//! shape, capture height and player count are configurable.
//!
//! ## Modules
//!
//! - [`constants`] - Default board, piece counts and search parameters
//! - [`geometry`] - Board layouts and precomputed move templates
//! - [`moves`] - Moves, undo records and search results
//! - [`state`] - Game state: move generation, apply/undo, evaluation
//! - [`playout`] - Random game simulation
//! - [`negamax`] - Alpha-beta search for two players
//! - [`montecarlo`] - Simulation-based search for any number of players
//! - [`selfplay`] - Automated games between agents
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mixtour_engine::geometry::BoardGeometry;
//! use mixtour_engine::moves::Move;
//! use mixtour_engine::negamax::{self, NegamaxConfig};
//! use mixtour_engine::state::GameState;
//!
//! // Create a new game on the standard board
//! let geometry = Arc::new(BoardGeometry::standard(2).unwrap());
//! let mut state = GameState::new(geometry);
//!
//! // Place a piece in the center
//! state.apply_move(Move::Place { dst: 12 });
//!
//! // Search for the best responses
//! let moves = state.generate_moves();
//! let best = negamax::find_best_moves(&mut state, &moves, &NegamaxConfig { depth: 2 }).unwrap();
//! println!("{} best moves, value {}", best.moves.len(), best.value);
//! ```

pub mod constants;
pub mod geometry;
pub mod montecarlo;
pub mod moves;
pub mod negamax;
pub mod playout;
pub mod selfplay;
pub mod state;
