//! Board geometry and precomputed move templates.
//!
//! A board is described by a row-major grid of single characters, surrounded
//! by an optional padding margin. Two marker characters denote cells that are
//! not playable (outside the board, and padding); every other character is a
//! playable field.
//!
//! Playable fields are numbered densely in scan order, so a board with holes
//! still has field indices `0..field_count`. Because occupancy is tracked as a
//! `u32` bitmask, at most [`MAX_FIELDS`] fields are supported.
//!
//! For every destination field and every receiving stack height, the geometry
//! lists the fields from which a stack could reach the destination in a
//! single straight line, together with the bitmask of fields in between that
//! must be empty for the move to be unobstructed. A stack of height `h` can
//! only receive pieces from exactly `h` steps away.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_COLS, DEFAULT_PADDING_SIZE, DEFAULT_PLAYER_COUNT, DEFAULT_ROWS,
    DEFAULT_WINNING_HEIGHT, MAX_FIELDS, MAX_PLAYERS, OUTSIDE, PADDING,
};

/// A playable field, represented as a dense index in `0..field_count`.
pub type Field = usize;

/// Bitmask with one bit per field.
pub type Mask = u32;

/// Row and column offsets of the 8 compass directions.
/// Order: NW, N, NE, W, E, SW, S, SE
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Errors raised while building a [`BoardGeometry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("invalid layout length: expected {expected} cells, got {actual}")]
    InvalidLayout { expected: usize, actual: usize },

    #[error("too many fields: {0} (maximum supported: {MAX_FIELDS})")]
    TooManyFields(usize),

    #[error("winning height must be at least 2 (got {0})")]
    InvalidWinningHeight(usize),

    #[error("player count must be between 2 and {MAX_PLAYERS} (got {0})")]
    InvalidPlayerCount(usize),
}

/// Parameters describing a board and its win condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    /// Number of rows, excluding padding.
    pub rows: usize,
    /// Number of columns, excluding padding.
    pub cols: usize,
    /// Marker for cells outside the board.
    pub outside: char,
    /// Marker for the padding margin.
    pub padding: char,
    /// Width of the padding margin on each side.
    pub padding_size: usize,
    /// Stack height at which a stack is captured.
    pub winning_height: usize,
    /// Number of players.
    pub player_count: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            outside: OUTSIDE,
            padding: PADDING,
            padding_size: DEFAULT_PADDING_SIZE,
            winning_height: DEFAULT_WINNING_HEIGHT,
            player_count: DEFAULT_PLAYER_COUNT,
        }
    }
}

impl BoardConfig {
    /// Rows of the grid including padding.
    pub fn padded_rows(&self) -> usize {
        self.rows + 2 * self.padding_size
    }

    /// Columns of the grid including padding.
    pub fn padded_cols(&self) -> usize {
        self.cols + 2 * self.padding_size
    }

    /// Whether a layout character denotes a playable field.
    #[inline]
    pub fn is_playable_marker(&self, c: char) -> bool {
        c != self.outside && c != self.padding
    }
}

/// A candidate source for a move onto some destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTemplate {
    /// Field the moving pieces come from.
    pub src: Field,
    /// Fields strictly between `src` and the destination.
    pub mask: Mask,
}

/// Immutable description of a board, shared by all game states on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardGeometry {
    config: BoardConfig,
    field_count: usize,
    /// Padded grid index -> field index (`None` for holes and padding).
    api_to_field: Vec<Option<Field>>,
    /// Field index -> padded grid index.
    field_to_api: Vec<usize>,
    /// `templates[dst][height]`, with `height` in `1..winning_height`.
    /// Index 0 is always empty.
    templates: Vec<Vec<Vec<MoveTemplate>>>,
}

impl BoardGeometry {
    /// Build the geometry for `layout`, a row-major string with one character
    /// per cell of the padded grid.
    pub fn build(config: BoardConfig, layout: &str) -> Result<Self, GeometryError> {
        if config.winning_height < 2 {
            return Err(GeometryError::InvalidWinningHeight(config.winning_height));
        }
        if !(2..=MAX_PLAYERS).contains(&config.player_count) {
            return Err(GeometryError::InvalidPlayerCount(config.player_count));
        }

        let cells: Vec<char> = layout.chars().collect();
        let rows = config.padded_rows();
        let cols = config.padded_cols();
        if cells.len() != rows * cols {
            return Err(GeometryError::InvalidLayout {
                expected: rows * cols,
                actual: cells.len(),
            });
        }

        let mut api_to_field = Vec::with_capacity(cells.len());
        let mut field_to_api = Vec::new();
        for (i, &c) in cells.iter().enumerate() {
            if config.is_playable_marker(c) {
                api_to_field.push(Some(field_to_api.len()));
                field_to_api.push(i);
            } else {
                api_to_field.push(None);
            }
        }
        let field_count = field_to_api.len();
        if field_count > MAX_FIELDS {
            return Err(GeometryError::TooManyFields(field_count));
        }

        let templates = field_to_api
            .iter()
            .map(|&api| build_templates(&config, &api_to_field, api))
            .collect();

        Ok(Self {
            config,
            field_count,
            api_to_field,
            field_to_api,
            templates,
        })
    }

    /// Build the standard 5x5 board for the given player count.
    pub fn standard(player_count: usize) -> Result<Self, GeometryError> {
        let config = BoardConfig {
            player_count,
            ..BoardConfig::default()
        };
        Self::build(config, crate::constants::STANDARD_LAYOUT)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    #[inline]
    pub fn winning_height(&self) -> usize {
        self.config.winning_height
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.config.player_count
    }

    pub fn rows(&self) -> usize {
        self.config.rows
    }

    pub fn cols(&self) -> usize {
        self.config.cols
    }

    /// Bitmask with a bit set for every field on the board.
    pub fn all_fields_mask(&self) -> Mask {
        if self.field_count == Mask::BITS as usize {
            Mask::MAX
        } else {
            (1 << self.field_count) - 1
        }
    }

    /// Candidate sources for a move onto `dst` that produce a stack of
    /// `height` pieces plus the moved ones.
    #[inline]
    pub fn templates(&self, dst: Field, height: usize) -> &[MoveTemplate] {
        self.templates[dst]
            .get(height)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Padded grid index of a field.
    pub fn api_index(&self, field: Field) -> usize {
        self.field_to_api[field]
    }

    /// Field at a padded grid index, if that cell is playable.
    pub fn field_of_api(&self, index: usize) -> Option<Field> {
        self.api_to_field.get(index).copied().flatten()
    }

    /// Field at an unpadded `(row, col)`, if that cell is playable.
    pub fn field_at(&self, row: usize, col: usize) -> Option<Field> {
        if row >= self.config.rows || col >= self.config.cols {
            return None;
        }
        let pad = self.config.padding_size;
        self.field_of_api((row + pad) * self.config.padded_cols() + col + pad)
    }

    /// Unpadded `(row, col)` of a field.
    pub fn row_col(&self, field: Field) -> (usize, usize) {
        let api = self.field_to_api[field];
        let stride = self.config.padded_cols();
        let pad = self.config.padding_size;
        (api / stride - pad, api % stride - pad)
    }
}

/// Walk outward from the destination at padded index `dst_api` in all 8
/// directions, recording every cell reachable in up to `winning_height - 1`
/// steps together with the cells passed on the way.
fn build_templates(
    config: &BoardConfig,
    api_to_field: &[Option<Field>],
    dst_api: usize,
) -> Vec<Vec<MoveTemplate>> {
    let rows = config.padded_rows() as isize;
    let cols = config.padded_cols() as isize;
    let r2 = dst_api as isize / cols;
    let c2 = dst_api as isize % cols;

    let mut by_height = vec![Vec::new(); config.winning_height];
    for (dr, dc) in DIRECTIONS {
        let mut mask: Mask = 0;
        for height in 1..config.winning_height {
            let r1 = r2 - dr * height as isize;
            let c1 = c2 - dc * height as isize;
            if r1 < 0 || r1 >= rows || c1 < 0 || c1 >= cols {
                break;
            }
            let Some(src) = api_to_field[(r1 * cols + c1) as usize] else {
                break;
            };
            by_height[height].push(MoveTemplate { src, mask });
            mask |= 1 << src;
        }
    }
    by_height
}
