#![warn(clippy::all, clippy::pedantic)]

//! The game engine: board, pieces and scoring tied together by a small state
//! machine.
//!
//! The engine never looks at a clock. Whoever drives it passes the elapsed
//! time into [`Engine::tick`], which makes it equally happy inside the real
//! terminal loop and inside a test.

use bevy_ecs::prelude::Resource;
use log::{debug, info, trace};
use std::time::Duration;

use crate::collision::{collides, drop_distance};
use crate::components::{Board, GameState, Tetromino, TetrominoType};
use crate::events::{GameListener, LockKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Paused,
    GameOver,
}

/// Everything a player (or an input adapter) can ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
    Start,
    PauseToggle,
    Reset,
}

/// Supplies the shape of every new piece.
pub trait PieceSource: Send + Sync {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform choice among the seven shapes.
pub struct RandomPieces {
    rng: fastrand::Rng,
}

impl RandomPieces {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomPieces {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::from_index(self.rng.usize(0..TetrominoType::ALL.len()))
    }
}

/// An owned copy of everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub board: Board,
    pub active: Option<Tetromino>,
    pub preview: Option<Tetromino>,
    pub stats: GameState,
    pub run_state: RunState,
}

#[derive(Resource)]
pub struct Engine {
    board: Board,
    active: Option<Tetromino>,
    preview: Option<Tetromino>,
    stats: GameState,
    run_state: RunState,
    drop_timer: Duration,
    pieces: Box<dyn PieceSource>,
    listeners: Vec<Box<dyn GameListener>>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_piece_source(Box::new(RandomPieces::new()))
    }

    #[must_use]
    pub fn with_piece_source(pieces: Box<dyn PieceSource>) -> Self {
        Self {
            board: Board::default(),
            active: None,
            preview: None,
            stats: GameState::default(),
            run_state: RunState::NotStarted,
            drop_timer: Duration::ZERO,
            pieces,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn GameListener>) {
        self.listeners.push(listener);
    }

    // Observation

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> Option<&Tetromino> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn preview_piece(&self) -> Option<&Tetromino> {
        self.preview.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &GameState {
        &self.stats
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.stats.drop_interval()
    }

    #[must_use]
    pub fn drop_timer(&self) -> Duration {
        self.drop_timer
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            active: self.active.clone(),
            preview: self.preview.clone(),
            stats: self.stats.clone(),
            run_state: self.run_state,
        }
    }

    // Intents

    pub fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::MoveLeft => self.move_left(),
            Intent::MoveRight => self.move_right(),
            Intent::SoftDrop => {
                self.soft_drop();
            }
            Intent::Rotate => self.rotate(),
            Intent::HardDrop => self.hard_drop(),
            Intent::Start => self.start(),
            Intent::PauseToggle => self.pause_toggle(),
            Intent::Reset => self.reset(),
        }
    }

    /// Starts a fresh game from NotStarted or GameOver.
    pub fn start(&mut self) {
        if !matches!(self.run_state, RunState::NotStarted | RunState::GameOver) {
            return;
        }

        info!("Starting new game");
        self.clear_game();
        self.set_run_state(RunState::Running);
        self.spawn_next();
    }

    pub fn pause_toggle(&mut self) {
        match self.run_state {
            RunState::Running => self.set_run_state(RunState::Paused),
            RunState::Paused => self.set_run_state(RunState::Running),
            RunState::NotStarted | RunState::GameOver => {}
        }
    }

    pub fn reset(&mut self) {
        debug!("Resetting game");
        self.clear_game();
        self.set_run_state(RunState::NotStarted);
    }

    pub fn move_left(&mut self) {
        self.try_shift(-1, 0);
    }

    pub fn move_right(&mut self) {
        self.try_shift(1, 0);
    }

    /// Pushes the piece down one row, worth a point when it moves.
    pub fn soft_drop(&mut self) -> bool {
        let moved = self.try_shift(0, 1);
        if moved {
            self.stats.award_soft_drop();
        }
        moved
    }

    pub fn rotate(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        let Some(active) = &self.active else {
            return;
        };

        let rotated = active.rotated();
        if collides(&self.board, &rotated, 0, 0) {
            trace!("Rotation rejected");
            return;
        }

        self.active = Some(rotated);
        for listener in &mut self.listeners {
            listener.on_rotate_accepted();
        }
    }

    pub fn hard_drop(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let distance = drop_distance(&self.board, active);
        active.position.y += distance;
        debug!("Hard drop of {distance} rows");

        self.lock_piece(LockKind::HardDrop);
    }

    /// Advances gravity by `delta`. Does nothing unless the game is running.
    pub fn tick(&mut self, delta: Duration) {
        if self.run_state != RunState::Running {
            return;
        }

        self.drop_timer = self.drop_timer.saturating_add(delta);
        if self.drop_timer <= self.drop_interval() {
            return;
        }

        trace!("Gravity step after {:?}", self.drop_timer);
        if !self.try_shift(0, 1) {
            self.lock_piece(LockKind::Landed);
        }
        self.drop_timer = Duration::ZERO;
    }

    // Internals

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if collides(&self.board, active, dx, dy) {
            return false;
        }

        active.position.x += dx;
        active.position.y += dy;
        true
    }

    fn lock_piece(&mut self, kind: LockKind) {
        let Some(active) = self.active.take() else {
            return;
        };

        self.board.commit(&active);
        debug!(
            "Locked {:?} at ({}, {})",
            active.tetromino_type, active.position.x, active.position.y
        );
        for listener in &mut self.listeners {
            listener.on_piece_locked(kind);
        }

        let cleared = u32::try_from(self.board.clear_full_lines()).unwrap_or(u32::MAX);
        if cleared > 0 {
            let previous_level = self.stats.level;
            let points = self.stats.update_score(cleared);
            info!("Cleared {cleared} lines for {points} points");
            if self.stats.level != previous_level {
                info!(
                    "Level {} reached, drop interval now {:?}",
                    self.stats.level,
                    self.drop_interval()
                );
            }
            for listener in &mut self.listeners {
                listener.on_lines_cleared(cleared);
            }
        }

        self.spawn_next();
    }

    /// Promotes the preview piece and checks whether it fits. A piece that
    /// does not fit ends the game and never becomes active.
    fn spawn_next(&mut self) {
        let active = match self.preview.take() {
            Some(preview) => preview,
            None => Tetromino::spawn(self.pieces.next_piece()),
        };
        self.preview = Some(Tetromino::spawn(self.pieces.next_piece()));

        if collides(&self.board, &active, 0, 0) {
            debug!("{:?} is blocked at spawn", active.tetromino_type);
            self.game_over();
            return;
        }
        self.active = Some(active);
    }

    fn game_over(&mut self) {
        let final_score = self.stats.score;
        info!("Game over with {final_score} points");

        self.set_run_state(RunState::GameOver);
        for listener in &mut self.listeners {
            listener.on_game_over(final_score);
        }
    }

    fn clear_game(&mut self) {
        self.board.clear();
        self.stats.reset();
        self.active = None;
        self.preview = None;
        self.drop_timer = Duration::ZERO;
    }

    fn set_run_state(&mut self, to: RunState) {
        let from = self.run_state;
        self.run_state = to;
        if from == to {
            return;
        }

        debug!("Run state {from:?} -> {to:?}");
        for listener in &mut self.listeners {
            listener.on_run_state_changed(from, to);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
