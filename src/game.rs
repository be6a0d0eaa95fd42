#![warn(clippy::all, clippy::pedantic)]

use std::time::Duration;

// Game board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

// Gravity timing
pub const BASE_DROP_INTERVAL: Duration = Duration::from_millis(1000);
pub const MIN_DROP_INTERVAL: Duration = Duration::from_millis(50);
pub const DROP_INTERVAL_STEP: Duration = Duration::from_millis(50);

// Line clear scoring (multiplied by the level the clear happened on)
pub const POINTS_PER_LINE: u32 = 100;
pub const MULTI_LINE_MULTIPLIER: u32 = 2; // Same bonus for 2, 3 and 4 lines
pub const SOFT_DROP_POINTS: u32 = 1; // Points per row soft dropped

// Level progression
pub const LINES_PER_LEVEL: u32 = 10;
pub const STARTING_LEVEL: u32 = 1;
