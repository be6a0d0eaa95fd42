#![warn(clippy::all, clippy::pedantic)]

pub mod sound_tests;

// Shared helpers
#[cfg(test)]
pub mod test_utils;
