use std::sync::{Arc, Mutex};

use crate::components::{Board, TetrominoType};
use crate::engine::{Engine, PieceSource, RunState};
use crate::events::{GameEvent, GameListener, LockKind};

/// Hands out a fixed sequence of shapes, starting over at the end.
pub struct CyclePieces {
    pieces: Vec<TetrominoType>,
    next: usize,
}

impl CyclePieces {
    pub fn new(pieces: &[TetrominoType]) -> Self {
        assert!(!pieces.is_empty(), "need at least one piece");
        Self {
            pieces: pieces.to_vec(),
            next: 0,
        }
    }

    pub fn only(piece: TetrominoType) -> Self {
        Self::new(&[piece])
    }
}

impl PieceSource for CyclePieces {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.next % self.pieces.len()];
        self.next += 1;
        piece
    }
}

/// Records every engine notification into a shared list the test keeps a
/// handle to.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl GameListener for EventRecorder {
    fn on_rotate_accepted(&mut self) {
        self.events.lock().unwrap().on_rotate_accepted();
    }

    fn on_piece_locked(&mut self, kind: LockKind) {
        self.events.lock().unwrap().on_piece_locked(kind);
    }

    fn on_lines_cleared(&mut self, count: u32) {
        self.events.lock().unwrap().on_lines_cleared(count);
    }

    fn on_game_over(&mut self, final_score: u32) {
        self.events.lock().unwrap().on_game_over(final_score);
    }

    fn on_run_state_changed(&mut self, from: RunState, to: RunState) {
        self.events.lock().unwrap().on_run_state_changed(from, to);
    }
}

/// An engine fed with `pieces` plus a recorder attached to it.
pub fn engine_with(pieces: &[TetrominoType]) -> (Engine, EventRecorder) {
    let mut engine = Engine::with_piece_source(Box::new(CyclePieces::new(pieces)));
    let recorder = EventRecorder::default();
    engine.add_listener(Box::new(recorder.clone()));
    (engine, recorder)
}

/// A running engine that only ever deals `piece`.
pub fn started_engine(piece: TetrominoType) -> (Engine, EventRecorder) {
    let (mut engine, recorder) = engine_with(&[piece]);
    engine.start();
    recorder.clear();
    (engine, recorder)
}

/// Fills row `y` except for the listed columns.
pub fn fill_row_except(board: &mut Board, y: i32, gaps: &[i32]) {
    for x in 0..board.width() as i32 {
        if !gaps.contains(&x) {
            board.set(x, y, Some(TetrominoType::Z));
        }
    }
}

pub fn occupied_count(board: &Board) -> usize {
    board
        .rows()
        .map(|row| row.iter().filter(|cell| cell.is_some()).count())
        .sum()
}
