#![warn(clippy::all, clippy::pedantic)]

use crate::engine::RunState;

/// How a piece came to be locked into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// Gravity could not move the piece any further.
    Landed,
    /// The player slammed the piece down.
    HardDrop,
}

/// Notifications fired by the engine at the moment things happen.
///
/// Every hook has an empty default so listeners only implement what they
/// care about. Listeners must not assume anything about the order in which
/// several listeners are called, only that a single listener sees events in
/// the order they occurred.
pub trait GameListener: Send + Sync {
    fn on_rotate_accepted(&mut self) {}

    fn on_piece_locked(&mut self, _kind: LockKind) {}

    fn on_lines_cleared(&mut self, _count: u32) {}

    fn on_game_over(&mut self, _final_score: u32) {}

    fn on_run_state_changed(&mut self, _from: RunState, _to: RunState) {}
}

/// The same notifications as plain values, for listeners that queue or
/// record them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    RotateAccepted,
    PieceLocked(LockKind),
    LinesCleared(u32),
    GameOver(u32),
    RunStateChanged { from: RunState, to: RunState },
}

impl GameListener for Vec<GameEvent> {
    fn on_rotate_accepted(&mut self) {
        self.push(GameEvent::RotateAccepted);
    }

    fn on_piece_locked(&mut self, kind: LockKind) {
        self.push(GameEvent::PieceLocked(kind));
    }

    fn on_lines_cleared(&mut self, count: u32) {
        self.push(GameEvent::LinesCleared(count));
    }

    fn on_game_over(&mut self, final_score: u32) {
        self.push(GameEvent::GameOver(final_score));
    }

    fn on_run_state_changed(&mut self, from: RunState, to: RunState) {
        self.push(GameEvent::RunStateChanged { from, to });
    }
}
