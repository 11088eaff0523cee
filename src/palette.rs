//! Fixed composition constants: the duration palette, pitch pool and the
//! ranges the assembler draws from.

use std::ops::RangeInclusive;

use crate::score::{NoteName, NoteValue, Pitch, TimeSignature};

/// Every score has exactly this many measures
pub const MEASURES_PER_SCORE: usize = 3;

/// Probability that any single slot becomes a rest
pub const REST_PROBABILITY: f64 = 0.2;

/// Tolerance for comparing summed quarter lengths
pub const DURATION_TOLERANCE: f64 = 1e-9;

/// Note values the partitioner draws from, longest first
pub const DURATION_PALETTE: [NoteValue; 5] = [
    NoteValue::Whole,
    NoteValue::Half,
    NoteValue::Quarter,
    NoteValue::Eighth,
    NoteValue::Sixteenth,
];

/// Natural pitches C4 through C6, ascending
pub const PITCH_POOL: [Pitch; 15] = [
    Pitch::new(NoteName::C, 4),
    Pitch::new(NoteName::D, 4),
    Pitch::new(NoteName::E, 4),
    Pitch::new(NoteName::F, 4),
    Pitch::new(NoteName::G, 4),
    Pitch::new(NoteName::A, 4),
    Pitch::new(NoteName::B, 4),
    Pitch::new(NoteName::C, 5),
    Pitch::new(NoteName::D, 5),
    Pitch::new(NoteName::E, 5),
    Pitch::new(NoteName::F, 5),
    Pitch::new(NoteName::G, 5),
    Pitch::new(NoteName::A, 5),
    Pitch::new(NoteName::B, 5),
    Pitch::new(NoteName::C, 6),
];

pub const TIME_SIGNATURE_OPTIONS: [TimeSignature; 2] =
    [TimeSignature::THREE_FOUR, TimeSignature::FOUR_FOUR];

/// Key signatures as fifths: two flats through two sharps
pub const KEY_FIFTHS_RANGE: RangeInclusive<i8> = -2..=2;

/// Quarter-note BPM
pub const TEMPO_RANGE: RangeInclusive<u16> = 80..=140;
