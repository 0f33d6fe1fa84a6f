//! Moves, undo records, and search results.
//!
//! On the wire a move is a triple `[src, count, dst]`, `[-1, 1, dst]` for
//! placing a new piece, or `[]` for passing. Inside the engine it is a
//! [`Move`] variant.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::PLACE_SOURCE;
use crate::geometry::Field;

/// A player id, `0..player_count`.
pub type Player = u8;

/// The pieces on a field, bottom to top.
pub type Stack = SmallVec<[Player; 8]>;

/// A move. Only valid relative to the state it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<i64>", try_from = "Vec<i64>")]
pub enum Move {
    /// No placement or shift is possible.
    Pass,
    /// Place a new piece of the player to move on an empty field.
    Place { dst: Field },
    /// Move the top `count` pieces of `src` onto `dst`.
    Shift { src: Field, count: usize, dst: Field },
}

impl Move {
    /// Whether playing `self` right after `last` would exactly undo `last`.
    #[inline]
    pub fn reverses(&self, last: &Move) -> bool {
        match (self, last) {
            (
                Move::Shift { src, count, dst },
                Move::Shift {
                    src: last_src,
                    count: last_count,
                    dst: last_dst,
                },
            ) => src == last_dst && dst == last_src && count == last_count,
            _ => false,
        }
    }
}

/// Error decoding a wire triple into a [`Move`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveDecodeError {
    #[error("expected 0 or 3 elements, got {0}")]
    BadLength(usize),

    #[error("placement must move exactly 1 piece (got {0})")]
    BadPlaceCount(i64),

    #[error("invalid field index {0}")]
    BadField(i64),

    #[error("shift count must be positive (got {0})")]
    BadCount(i64),
}

impl From<Move> for Vec<i64> {
    fn from(mv: Move) -> Self {
        match mv {
            Move::Pass => Vec::new(),
            Move::Place { dst } => vec![PLACE_SOURCE, 1, dst as i64],
            Move::Shift { src, count, dst } => vec![src as i64, count as i64, dst as i64],
        }
    }
}

impl TryFrom<Vec<i64>> for Move {
    type Error = MoveDecodeError;

    fn try_from(v: Vec<i64>) -> Result<Self, Self::Error> {
        let field = |i: i64| usize::try_from(i).map_err(|_| MoveDecodeError::BadField(i));
        match v.as_slice() {
            [] => Ok(Move::Pass),
            &[PLACE_SOURCE, count, dst] => {
                if count != 1 {
                    return Err(MoveDecodeError::BadPlaceCount(count));
                }
                Ok(Move::Place { dst: field(dst)? })
            }
            &[src, count, dst] => {
                if count <= 0 {
                    return Err(MoveDecodeError::BadCount(count));
                }
                Ok(Move::Shift {
                    src: field(src)?,
                    count: count as usize,
                    dst: field(dst)?,
                })
            }
            other => Err(MoveDecodeError::BadLength(other.len())),
        }
    }
}

/// Information needed to undo a move, returned by
/// [`GameState::apply_move`](crate::state::GameState::apply_move).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoRecord {
    /// The last move before the move was applied.
    pub(crate) last_move: Option<Move>,
    /// The stack removed by a capture, bottom to top.
    pub(crate) captured: Option<Stack>,
}

impl UndoRecord {
    /// The stack captured by the move, if any. Its top piece is the capturer.
    pub fn captured(&self) -> Option<&[Player]> {
        self.captured.as_deref()
    }
}

/// Moves classified by whether they complete a capturing stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triage {
    /// Captures credited to the player to move.
    pub winning: Vec<Move>,
    /// Moves that capture nothing, including pass and placements.
    pub neutral: Vec<Move>,
    /// Captures credited to another player.
    pub losing: Vec<Move>,
}

/// Errors returned by the searches before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("no candidate moves to choose from")]
    NoCandidateMoves,

    #[error("search supports exactly 2 players (got {0})")]
    UnsupportedPlayerCount(usize),
}

/// The moves tied for the best value found by a search.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMoves<V> {
    pub moves: Vec<Move>,
    pub value: V,
}
