//! Constants for board layout, engine parameters, and heuristic weights.
//!
//! Board geometry is chosen at runtime (see [`crate::geometry`]), so the
//! values here are only defaults. The standard board is a 5x5 square with a
//! one-cell padding margin, laid out row-major:
//!
//! ```text
//! -------
//! -.....-
//! -.....-
//! -.....-
//! -.....-
//! -.....-
//! -------
//! ```

// =============================================================================
// Board Geometry
// =============================================================================

/// Maximum number of playable fields. Occupancy is a `u32` bitmask.
pub const MAX_FIELDS: usize = 30;

/// Rows of the standard board (excluding padding).
pub const DEFAULT_ROWS: usize = 5;

/// Columns of the standard board (excluding padding).
pub const DEFAULT_COLS: usize = 5;

/// Padding margin around the standard board.
pub const DEFAULT_PADDING_SIZE: usize = 1;

/// Stack height at which a stack is captured as a tower.
pub const DEFAULT_WINNING_HEIGHT: usize = 5;

/// Number of players in the standard game.
pub const DEFAULT_PLAYER_COUNT: usize = 2;

/// Maximum number of players. Player ids are written as single digits.
pub const MAX_PLAYERS: usize = 9;

/// Layout marker for cells that are not part of the board.
pub const OUTSIDE: char = '#';

/// Layout marker for the padding margin.
pub const PADDING: char = '-';

/// Layout of the standard 5x5 board with a one-cell padding margin.
pub const STANDARD_LAYOUT: &str = concat!(
    "-------",
    "-.....-",
    "-.....-",
    "-.....-",
    "-.....-",
    "-.....-",
    "-------",
);

// =============================================================================
// Game Setup
// =============================================================================

/// Pieces per player in a game with at most two players.
pub const PIECES_TWO_PLAYERS: u32 = 20;

/// Pieces per player in a game with three or more players.
pub const PIECES_MANY_PLAYERS: u32 = 15;

/// Towers a player must capture to win, unless configured otherwise.
pub const DEFAULT_TOWERS_TO_WIN: u32 = 1;

/// Source sentinel used by the wire encoding of a placement move.
pub const PLACE_SOURCE: i64 = -1;

// =============================================================================
// Negamax Parameters
// =============================================================================

/// Default search depth in plies. Higher is stronger but slower.
pub const SEARCH_DEPTH: u32 = 4;

/// Magnitude of the evaluation of a decided game.
pub const WIN_SCORE: i64 = 1_000_000_000;

/// Weight of the difference in towers still needed.
pub const TOWER_WEIGHT: i64 = 10_000;

/// Bonus per capturing shift available to the player to move.
pub const IMMEDIATE_WIN_BONUS: i64 = 1_000;

/// Penalty per capturing shift that would credit the opponent.
pub const IMMEDIATE_LOSS_PENALTY: i64 = 100;

/// Weight per stack height for owning the top piece of a stack.
pub const TOP_PIECE_WEIGHT: i64 = 10;

// =============================================================================
// Monte Carlo Parameters
// =============================================================================

/// Total number of simulations, divided across candidate moves.
pub const TOTAL_SIMULATIONS: usize = 4000;

/// Lower bound on simulations per candidate move.
pub const MIN_SIMULATIONS_PER_MOVE: usize = 10;

/// Playout step cap, used to break out of loops and pass cycles.
pub const MAX_STEPS_TO_SIMULATE: usize = 250;

/// Towers to win forced on simulated states.
pub const SIMULATION_TOWERS_TO_WIN: u32 = 1;

/// Score of a playout won by the player who moved.
pub const PLAYOUT_WIN: f64 = 1.0;

/// Score of a playout that hit the step cap without a winner.
pub const PLAYOUT_INCONCLUSIVE: f64 = 0.5;

/// Score of a playout lost by the player who moved.
pub const PLAYOUT_LOSS: f64 = 0.0;

// =============================================================================
// Self-play
// =============================================================================

/// Maximum number of moves in a self-play game.
pub const MAX_GAME_LEN: usize = 1000;
