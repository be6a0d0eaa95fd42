#![warn(clippy::all, clippy::pedantic)]

//! Background music as data.
//!
//! The game only decides *when* the tune plays. The notes themselves are a
//! fixed table that the audio driver walks through, looping forever.

use std::iter::Cycle;
use std::slice::Iter;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub frequency: f32,
    pub seconds: f32,
}

impl Note {
    const fn new(frequency: f32, seconds: f32) -> Self {
        Self { frequency, seconds }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(self.seconds)
    }
}

const E5: f32 = 659.25;
const D5: f32 = 587.33;
const C5: f32 = 523.25;
const B4: f32 = 493.88;
const A4: f32 = 440.00;

/// Opening phrase of Korobeiniki.
pub const KOROBEINIKI: [Note; 19] = [
    Note::new(E5, 0.5),
    Note::new(B4, 0.25),
    Note::new(C5, 0.25),
    Note::new(D5, 0.5),
    Note::new(C5, 0.25),
    Note::new(B4, 0.25),
    Note::new(A4, 0.5),
    Note::new(A4, 0.25),
    Note::new(C5, 0.25),
    Note::new(E5, 0.5),
    Note::new(D5, 0.25),
    Note::new(C5, 0.25),
    Note::new(B4, 1.0),
    Note::new(C5, 0.25),
    Note::new(D5, 0.5),
    Note::new(E5, 0.5),
    Note::new(C5, 0.5),
    Note::new(A4, 0.5),
    Note::new(A4, 1.0),
];

#[derive(Debug, Clone, Copy)]
pub struct Melody {
    notes: &'static [Note],
}

impl Melody {
    #[must_use]
    pub const fn new(notes: &'static [Note]) -> Self {
        Self { notes }
    }

    #[must_use]
    pub const fn korobeiniki() -> Self {
        Self::new(&KOROBEINIKI)
    }

    #[must_use]
    pub fn notes(&self) -> &'static [Note] {
        self.notes
    }

    /// Length of one pass through the tune.
    #[must_use]
    pub fn length(&self) -> Duration {
        self.notes.iter().map(Note::duration).sum()
    }

    /// An endless walk over the notes. Calling this again restarts from the
    /// first note.
    #[must_use]
    pub fn play(&self) -> Cycle<Iter<'static, Note>> {
        self.notes.iter().cycle()
    }
}

impl Default for Melody {
    fn default() -> Self {
        Self::korobeiniki()
    }
}
