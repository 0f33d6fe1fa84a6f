//! Game state representation and move execution.
//!
//! This module provides the core game logic, including:
//! - Per-field stacks of pieces with an occupancy bitmask kept in sync
//! - Move generation from the precomputed templates of a [`BoardGeometry`]
//! - Reversible move application (`apply_move` / `undo_move`)
//! - Static evaluation and move triage used by the searches
//!
//! Rules of the game:
//!  - <https://spielstein.com/games/mixtour/rules> (2 players)
//!  - <https://spielstein.com/games/mixtour/rules/a-trois> (3 players)

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_TOWERS_TO_WIN, IMMEDIATE_LOSS_PENALTY, IMMEDIATE_WIN_BONUS, PIECES_MANY_PLAYERS,
    PIECES_TWO_PLAYERS, TOP_PIECE_WEIGHT, TOWER_WEIGHT, WIN_SCORE,
};
use crate::geometry::{BoardGeometry, Field, Mask};
use crate::moves::{Move, Player, Stack, Triage, UndoRecord};

/// Errors raised when reconstructing a state from external data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("expected {expected} entries in {name}, got {actual}")]
    PlayerCount {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("next player {0} is out of range")]
    NextPlayer(Player),

    #[error("invalid piece {piece:?} on field {field}")]
    InvalidPiece { field: Field, piece: char },

    #[error("stack of height {height} on field {field} should have been captured")]
    StackTooHigh { field: Field, height: usize },

    #[error("player {0} has more pieces on the board than available")]
    TooManyPieces(Player),
}

/// Serializable form of a [`GameState`].
///
/// The occupancy bitmask is not part of the snapshot; it is always derived
/// from `fields` when a state is reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub fields: Vec<Vec<Player>>,
    pub next_player: Player,
    pub last_move: Option<Move>,
    pub pieces_left: Vec<u32>,
    pub scores_left: Vec<u32>,
}

/// A game in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    geometry: Arc<BoardGeometry>,
    /// Stacks of pieces, bottom to top, one per field.
    fields: Vec<Stack>,
    /// Bit `f` is set iff `fields[f]` is nonempty.
    occupied: Mask,
    /// Player to move.
    next_player: Player,
    /// Last move played, to forbid immediately reversing it.
    last_move: Option<Move>,
    /// Pieces each player has left to place.
    pieces_left: Vec<u32>,
    /// Towers each player still needs to capture. Zero means that player won.
    scores_left: Vec<u32>,
}

/// Default number of pieces per player for a player count.
pub fn default_pieces(player_count: usize) -> u32 {
    if player_count <= 2 {
        PIECES_TWO_PLAYERS
    } else {
        PIECES_MANY_PLAYERS
    }
}

impl GameState {
    /// Create an empty board with the default piece and tower counts.
    pub fn new(geometry: Arc<BoardGeometry>) -> Self {
        let pieces = default_pieces(geometry.player_count());
        Self::with_counts(geometry, pieces, DEFAULT_TOWERS_TO_WIN)
    }

    /// Create an empty board where every player has `pieces` pieces and
    /// needs `towers` towers to win.
    pub fn with_counts(geometry: Arc<BoardGeometry>, pieces: u32, towers: u32) -> Self {
        let players = geometry.player_count();
        Self {
            fields: vec![Stack::new(); geometry.field_count()],
            occupied: 0,
            next_player: 0,
            last_move: None,
            pieces_left: vec![pieces; players],
            scores_left: vec![towers; players],
            geometry,
        }
    }

    /// Reconstruct a state from a snapshot.
    pub fn from_snapshot(
        geometry: Arc<BoardGeometry>,
        snapshot: Snapshot,
    ) -> Result<Self, StateError> {
        let players = geometry.player_count();
        check_len("piecesLeft", players, snapshot.pieces_left.len())?;
        check_len("scoresLeft", players, snapshot.scores_left.len())?;
        if snapshot.next_player as usize >= players {
            return Err(StateError::NextPlayer(snapshot.next_player));
        }
        let fields = snapshot
            .fields
            .into_iter()
            .map(Stack::from_vec)
            .collect::<Vec<_>>();
        validate_fields(&geometry, &fields)?;

        let mut state = Self {
            occupied: 0,
            fields,
            next_player: snapshot.next_player,
            last_move: snapshot.last_move,
            pieces_left: snapshot.pieces_left,
            scores_left: snapshot.scores_left,
            geometry,
        };
        state.occupied = state.compute_occupied();
        Ok(state)
    }

    /// Reconstruct a state from a host board: one string per cell of the
    /// padded grid, where a playable cell lists its pieces bottom to top as
    /// player digits starting at `'1'`.
    ///
    /// Pieces left are recomputed as `pieces_per_player` minus the pieces on
    /// the board.
    pub fn from_cells<S: AsRef<str>>(
        geometry: Arc<BoardGeometry>,
        cells: &[S],
        next_player: Player,
        pieces_per_player: u32,
        scores_left: Vec<u32>,
    ) -> Result<Self, StateError> {
        let config = geometry.config();
        let expected = config.padded_rows() * config.padded_cols();
        if cells.len() != expected {
            return Err(StateError::FieldCount {
                expected,
                actual: cells.len(),
            });
        }

        let players = geometry.player_count();
        let mut pieces_left = vec![pieces_per_player; players];
        let mut fields = Vec::with_capacity(geometry.field_count());
        for field in 0..geometry.field_count() {
            let mut stack = Vec::new();
            for c in cells[geometry.api_index(field)].as_ref().chars() {
                let piece = c
                    .to_digit(10)
                    .and_then(|d| d.checked_sub(1))
                    .filter(|&p| (p as usize) < players)
                    .ok_or(StateError::InvalidPiece { field, piece: c })?;
                let left = &mut pieces_left[piece as usize];
                *left = left
                    .checked_sub(1)
                    .ok_or(StateError::TooManyPieces(piece as Player))?;
                stack.push(piece as Player);
            }
            fields.push(stack);
        }

        Self::from_snapshot(
            geometry,
            Snapshot {
                fields,
                next_player,
                last_move: None,
                pieces_left,
                scores_left,
            },
        )
    }

    /// Capture the state as a snapshot.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            fields: self.fields.iter().map(|s| s.to_vec()).collect(),
            next_player: self.next_player,
            last_move: self.last_move,
            pieces_left: self.pieces_left.clone(),
            scores_left: self.scores_left.clone(),
        }
    }

    /// Deep copy of this state. If `towers` is given, every player's towers
    /// still needed is forced to that value.
    pub fn clone_with_towers(&self, towers: Option<u32>) -> Self {
        let mut state = self.clone();
        if let Some(towers) = towers {
            state.scores_left.fill(towers);
        }
        state
    }

    pub fn geometry(&self) -> &Arc<BoardGeometry> {
        &self.geometry
    }

    pub fn fields(&self) -> &[Stack] {
        &self.fields
    }

    /// Pieces on a field, bottom to top.
    pub fn stack(&self, field: Field) -> &[Player] {
        &self.fields[field]
    }

    pub fn occupied(&self) -> Mask {
        self.occupied
    }

    pub fn next_player(&self) -> Player {
        self.next_player
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn pieces_left(&self) -> &[u32] {
        &self.pieces_left
    }

    pub fn scores_left(&self) -> &[u32] {
        &self.scores_left
    }

    pub fn player_count(&self) -> usize {
        self.geometry.player_count()
    }

    /// The first player who needs no more towers, if any.
    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.scores_left
            .iter()
            .position(|&s| s == 0)
            .map(|p| p as Player)
    }

    /// Generate all legal moves.
    ///
    /// Returns an empty list iff the game is over, and `[Move::Pass]` iff no
    /// placement or shift is possible.
    pub fn generate_moves(&self) -> Vec<Move> {
        if self.winner().is_some() {
            return Vec::new();
        }
        let can_place = self.pieces_left[self.next_player as usize] > 0;
        let mut moves = Vec::new();
        for (dst, stack) in self.fields.iter().enumerate() {
            if stack.is_empty() {
                if can_place {
                    moves.push(Move::Place { dst });
                }
                continue;
            }
            for t in self.geometry.templates(dst, stack.len()) {
                let src_height = self.fields[t.src].len();
                if src_height == 0 || self.occupied & t.mask != 0 {
                    continue;
                }
                for count in 1..=src_height {
                    let mv = Move::Shift {
                        src: t.src,
                        count,
                        dst,
                    };
                    // Undoing the last move is not allowed.
                    if self.last_move.is_some_and(|last| mv.reverses(&last)) {
                        continue;
                    }
                    moves.push(mv);
                }
            }
        }
        if moves.is_empty() {
            moves.push(Move::Pass);
        }
        moves
    }

    /// Play a move generated by [`generate_moves`](Self::generate_moves) on
    /// this exact state.
    ///
    /// Passing hands the turn back to the previous player (the opponent in a
    /// two-player game) and leaves the last move unchanged.
    pub fn apply_move(&mut self, mv: Move) -> UndoRecord {
        // Reversed in undo_move(). Keep the two in sync.
        let last_move = self.last_move;
        let mut captured = None;
        match mv {
            Move::Pass => {
                self.retreat_player();
                return UndoRecord {
                    last_move,
                    captured,
                };
            }
            Move::Place { dst } => {
                let player = self.next_player;
                self.pieces_left[player as usize] -= 1;
                self.fields[dst].push(player);
                self.occupied ^= 1 << dst;
            }
            Move::Shift { src, count, dst } => {
                let split = self.fields[src].len() - count;
                let moved: Stack = self.fields[src].drain(split..).collect();
                if self.fields[src].is_empty() {
                    self.occupied ^= 1 << src;
                }
                self.fields[dst].extend(moved);
                if self.fields[dst].len() >= self.geometry.winning_height() {
                    let removed = std::mem::take(&mut self.fields[dst]);
                    let winner = removed[removed.len() - 1];
                    self.scores_left[winner as usize] -= 1;
                    self.occupied ^= 1 << dst;
                    for &p in &removed {
                        self.pieces_left[p as usize] += 1;
                    }
                    captured = Some(removed);
                }
            }
        }
        self.advance_player();
        self.last_move = Some(mv);
        self.debug_check();
        UndoRecord {
            last_move,
            captured,
        }
    }

    /// Undo `mv`, which must be the last move applied to this state, using
    /// the record returned by the corresponding [`apply_move`](Self::apply_move).
    pub fn undo_move(&mut self, mv: Move, undo: UndoRecord) {
        // Reverse of apply_move(). Keep the two in sync.
        match mv {
            Move::Pass => {
                self.advance_player();
                return;
            }
            Move::Place { dst } => {
                self.retreat_player();
                self.pieces_left[self.next_player as usize] += 1;
                self.fields[dst].pop();
                self.occupied ^= 1 << dst;
            }
            Move::Shift { src, count, dst } => {
                self.retreat_player();
                if let Some(removed) = undo.captured {
                    for &p in &removed {
                        self.pieces_left[p as usize] -= 1;
                    }
                    let winner = removed[removed.len() - 1];
                    self.scores_left[winner as usize] += 1;
                    self.fields[dst] = removed;
                    self.occupied ^= 1 << dst;
                }
                if self.fields[src].is_empty() {
                    self.occupied ^= 1 << src;
                }
                let split = self.fields[dst].len() - count;
                let moved: Stack = self.fields[dst].drain(split..).collect();
                self.fields[src].extend(moved);
            }
        }
        self.last_move = undo.last_move;
        self.debug_check();
    }

    /// Statically evaluate the state for the player to move, without
    /// searching. Only meaningful for two players.
    ///
    /// Decided games score `±WIN_SCORE`. Otherwise the score combines the
    /// difference in towers still needed, capturing shifts available right
    /// now, ownership of stack tops, and ownership of buried pieces.
    pub fn evaluate(&self) -> i64 {
        debug_assert_eq!(self.player_count(), 2, "evaluation requires two players");
        let me = self.next_player;
        if let Some(winner) = self.winner() {
            return if winner == me { WIN_SCORE } else { -WIN_SCORE };
        }
        let opponent = 1 - me as usize;
        let winning_height = self.geometry.winning_height();
        let mut score = TOWER_WEIGHT
            * (self.scores_left[opponent] as i64 - self.scores_left[me as usize] as i64);

        for (dst, stack) in self.fields.iter().enumerate() {
            let height = stack.len();
            if height == 0 {
                continue;
            }
            for t in self.geometry.templates(dst, height) {
                let src = &self.fields[t.src];
                if src.len() + height >= winning_height && self.occupied & t.mask == 0 {
                    if src.last() == Some(&me) {
                        score += IMMEDIATE_WIN_BONUS;
                    } else {
                        // The opponent threatens a tower, though it might still be prevented.
                        score -= IMMEDIATE_LOSS_PENALTY;
                    }
                }
            }
            let top = TOP_PIECE_WEIGHT * height as i64;
            score += if stack[height - 1] == me { top } else { -top };
            for (depth, &p) in stack.iter().enumerate() {
                let weight = 1 + depth as i64;
                score += if p == me { weight } else { -weight };
            }
        }
        score
    }

    /// Classify moves by whether they complete a capturing stack for the
    /// player to move, for another player, or not at all.
    pub fn triage_moves(&self, moves: &[Move]) -> Triage {
        let winning_height = self.geometry.winning_height();
        let mut triage = Triage::default();
        for &mv in moves {
            match mv {
                Move::Shift { src, count, dst }
                    if self.fields[dst].len() + count >= winning_height =>
                {
                    if self.fields[src].last() == Some(&self.next_player) {
                        triage.winning.push(mv);
                    } else {
                        triage.losing.push(mv);
                    }
                }
                Move::Pass | Move::Place { .. } | Move::Shift { .. } => triage.neutral.push(mv),
            }
        }
        triage
    }

    #[inline]
    fn advance_player(&mut self) {
        self.next_player += 1;
        if self.next_player as usize == self.player_count() {
            self.next_player = 0;
        }
    }

    #[inline]
    fn retreat_player(&mut self) {
        if self.next_player == 0 {
            self.next_player = self.player_count() as Player;
        }
        self.next_player -= 1;
    }

    fn compute_occupied(&self) -> Mask {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .fold(0, |mask, (i, _)| mask | 1 << i)
    }

    #[inline]
    fn debug_check(&self) {
        debug_assert_eq!(
            self.occupied,
            self.compute_occupied(),
            "occupancy out of sync with fields"
        );
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<(), StateError> {
    if expected == actual {
        Ok(())
    } else {
        Err(StateError::PlayerCount {
            name,
            expected,
            actual,
        })
    }
}

fn validate_fields(geometry: &BoardGeometry, fields: &[Stack]) -> Result<(), StateError> {
    if fields.len() != geometry.field_count() {
        return Err(StateError::FieldCount {
            expected: geometry.field_count(),
            actual: fields.len(),
        });
    }
    for (field, stack) in fields.iter().enumerate() {
        if stack.len() >= geometry.winning_height() {
            return Err(StateError::StackTooHigh {
                field,
                height: stack.len(),
            });
        }
        if let Some(&p) = stack.iter().find(|&&p| p as usize >= geometry.player_count()) {
            return Err(StateError::InvalidPiece {
                field,
                piece: char::from_digit(p as u32 + 1, 10).unwrap_or('?'),
            });
        }
    }
    Ok(())
}

/// Renders the board with row numbers and column letters. Holes are shown as
/// `#`, empty fields as `.`, and stacks as player numbers from bottom to top.
impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |v: &[u32]| {
            v.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        let geo = &self.geometry;
        let width = geo.winning_height();
        writeln!(f, "Scores left: {}", join(&self.scores_left))?;
        writeln!(f, "Pieces left: {}", join(&self.pieces_left))?;
        writeln!(f, "Player {} to move.", self.next_player + 1)?;
        for row in 0..geo.rows() {
            let mut line = format!("{}  ", row + 1);
            for col in 0..geo.cols() {
                let part = match geo.field_at(row, col) {
                    None => "#".to_string(),
                    Some(field) if self.fields[field].is_empty() => ".".to_string(),
                    Some(field) => self.fields[field]
                        .iter()
                        .map(|&p| char::from_digit(p as u32 + 1, 36).unwrap_or('?'))
                        .collect(),
                };
                line.push_str(&format!(" {part:<width$}"));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        let mut footer = String::from("   ");
        for col in 0..geo.cols() {
            let letter = u32::try_from(col)
                .ok()
                .and_then(|c| ('a' as u32).checked_add(c))
                .and_then(char::from_u32)
                .unwrap_or('?');
            footer.push_str(&format!(" {letter:<width$}"));
        }
        writeln!(f, "{}", footer.trim_end())
    }
}
