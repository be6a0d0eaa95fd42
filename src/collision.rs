#![warn(clippy::all, clippy::pedantic)]

use crate::components::{Board, Tetromino};

/// Would `tetromino`, shifted by `(dx, dy)`, hit a wall, the floor or a
/// settled block?
///
/// Cells above the board are never checked against the grid, so pieces may
/// poke out of the top while spawning. Movement, rotation, spawning and hard
/// drops all go through this one check.
#[must_use]
pub fn collides(board: &Board, tetromino: &Tetromino, dx: i32, dy: i32) -> bool {
    tetromino
        .cells()
        .any(|(x, y)| board.is_occupied(x + dx, y + dy))
}

/// How many rows the piece can fall before it lands.
#[must_use]
pub fn drop_distance(board: &Board, tetromino: &Tetromino) -> i32 {
    let mut distance = 0;
    while !collides(board, tetromino, 0, distance + 1) {
        distance += 1;
    }
    distance
}
