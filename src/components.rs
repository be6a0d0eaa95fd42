#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow sign loss when going from signed to unsigned types since we validate values are non-negative before casting
    clippy::cast_sign_loss,
    // Allow potential wrapping when casting between types of same size as we validate values are in range
    clippy::cast_possible_wrap
)]

use ratatui::style::Color;
use std::time::Duration;

use crate::game::{
    BASE_DROP_INTERVAL, BOARD_WIDTH, DROP_INTERVAL_STEP, LINES_PER_LEVEL, MIN_DROP_INTERVAL,
    MULTI_LINE_MULTIPLIER, POINTS_PER_LINE, SOFT_DROP_POINTS, STARTING_LEVEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoType {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::O,
        TetrominoType::T,
        TetrominoType::S,
        TetrominoType::Z,
        TetrominoType::J,
        TetrominoType::L,
    ];

    /// Maps any index onto one of the seven shapes, wrapping around.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Canonical spawn orientation, one string per row.
    #[must_use]
    fn pattern(self) -> &'static [&'static str] {
        match self {
            TetrominoType::I => &["####"],
            TetrominoType::O => &["##", "##"],
            TetrominoType::T => &[".#.", "###"],
            TetrominoType::S => &[".##", "##."],
            TetrominoType::Z => &["##.", ".##"],
            TetrominoType::J => &["#..", "###"],
            TetrominoType::L => &["..#", "###"],
        }
    }

    #[must_use]
    pub fn shape(self) -> Shape {
        Shape::from_pattern(self.pattern())
    }

    // Retro neon palette
    #[must_use]
    pub fn color(self) -> Color {
        match self {
            TetrominoType::I => Color::Rgb(0x39, 0xff, 0x14),
            TetrominoType::O => Color::Rgb(0xff, 0xff, 0x00),
            TetrominoType::T => Color::Rgb(0xff, 0x07, 0x3a),
            TetrominoType::S => Color::Rgb(0x41, 0x69, 0xe1),
            TetrominoType::Z => Color::Rgb(0xff, 0x45, 0x00),
            TetrominoType::J => Color::Rgb(0x99, 0x32, 0xcc),
            TetrominoType::L => Color::Rgb(0x00, 0xff, 0xff),
        }
    }
}

/// A rectangular occupancy matrix in row-major order.
///
/// Shapes are never mutated; rotating one yields a new matrix, so the
/// original stays valid when a rotation is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    fn from_pattern(pattern: &[&str]) -> Self {
        Self {
            rows: pattern
                .iter()
                .map(|row| row.chars().map(|c| c == '#').collect())
                .collect(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_filled(&self, col: usize, row: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Occupied cells as `(col, row)` offsets from the top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(col, _)| (col as i32, row as i32))
        })
    }

    /// 90 degree clockwise rotation: transpose, then reverse each row.
    #[must_use]
    pub fn rotated(&self) -> Self {
        let height = self.height();
        let rows = (0..self.width())
            .map(|col| {
                (0..height)
                    .rev()
                    .map(|row| self.is_filled(col, row))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tetromino {
    pub tetromino_type: TetrominoType,
    pub shape: Shape,
    pub position: Position,
}

impl Tetromino {
    /// Builds the canonical orientation, horizontally centred on the top row.
    #[must_use]
    pub fn spawn(tetromino_type: TetrominoType) -> Self {
        let width = tetromino_type.shape().width();
        let x = (BOARD_WIDTH / 2) as i32 - (width / 2) as i32;
        Self::at(tetromino_type, x, 0)
    }

    /// Canonical orientation with its top-left corner at `(x, y)`.
    #[must_use]
    pub fn at(tetromino_type: TetrominoType, x: i32, y: i32) -> Self {
        Self {
            tetromino_type,
            shape: tetromino_type.shape(),
            position: Position { x, y },
        }
    }

    /// Same piece with its shape turned clockwise; the position is kept.
    #[must_use]
    pub fn rotated(&self) -> Self {
        Self {
            tetromino_type: self.tetromino_type,
            shape: self.shape.rotated(),
            position: self.position,
        }
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let Position { x, y } = self.position;
        self.shape.cells().map(move |(col, row)| (x + col, y + row))
    }
}

pub type Cell = Option<TetrominoType>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    rows: Vec<Vec<Cell>>,
}

impl Board {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rows: vec![vec![None; width]; height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(None);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(Option::is_none))
    }

    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .flatten()
    }

    /// Writes a single cell. Returns false when the coordinates are off the board.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match self
            .rows
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Walls and floor are solid, the space above the board is open.
    #[must_use]
    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        if x < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.rows[y as usize][x as usize].is_some()
    }

    /// Copies the piece into the grid. Cells above the top row are dropped.
    ///
    /// Does not check for collisions; callers validate the position first.
    pub fn commit(&mut self, tetromino: &Tetromino) {
        for (x, y) in tetromino.cells() {
            if y >= 0 {
                self.set(x, y, Some(tetromino.tetromino_type));
            }
        }
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(Option::is_some))
    }

    /// Removes every full row, shifting the rows above down, and returns how
    /// many were removed.
    pub fn clear_full_lines(&mut self) -> usize {
        let mut lines_cleared = 0;
        let mut y = self.height;

        while y > 0 {
            if self.is_row_full(y - 1) {
                self.rows.remove(y - 1);
                self.rows.insert(0, vec![None; self.width]);
                lines_cleared += 1;
                // Re-examine the same index, the row above now sits there
                continue;
            }
            y -= 1;
        }

        lines_cleared
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, crate::game::BOARD_HEIGHT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            level: STARTING_LEVEL,
            lines_cleared: 0,
        }
    }
}

impl GameState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Points for clearing `lines` rows at once on `level`.
    #[must_use]
    pub fn line_clear_points(lines: u32, level: u32) -> u32 {
        let bonus = if lines > 1 { MULTI_LINE_MULTIPLIER } else { 1 };
        lines
            .saturating_mul(POINTS_PER_LINE)
            .saturating_mul(level)
            .saturating_mul(bonus)
    }

    /// Applies a line clear and returns the points it was worth.
    pub fn update_score(&mut self, lines: u32) -> u32 {
        if lines == 0 {
            return 0;
        }

        let points = Self::line_clear_points(lines, self.level);
        self.score = self.score.saturating_add(points);
        self.lines_cleared = self.lines_cleared.saturating_add(lines);
        self.update_level();

        points
    }

    pub fn award_soft_drop(&mut self) {
        self.score = self.score.saturating_add(SOFT_DROP_POINTS);
    }

    pub fn update_level(&mut self) {
        self.level = Self::level_for_lines(self.lines_cleared);
    }

    #[must_use]
    pub fn level_for_lines(lines: u32) -> u32 {
        lines / LINES_PER_LEVEL + STARTING_LEVEL
    }

    #[must_use]
    pub fn drop_interval_for_level(level: u32) -> Duration {
        let speed_up = DROP_INTERVAL_STEP.saturating_mul(level.saturating_sub(1));
        BASE_DROP_INTERVAL
            .saturating_sub(speed_up)
            .max(MIN_DROP_INTERVAL)
    }

    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        Self::drop_interval_for_level(self.level)
    }
}
