//! # Score Model
//!
//! This module defines the data structures for a generated incipit.
//!
//! ## Type Hierarchy
//! ```text
//! Score
//!   ├── Clef (always treble)
//!   ├── KeySignature (fifths, -2..=2)
//!   ├── TimeSignature (3/4 or 4/4)
//!   ├── Tempo (quarter-note BPM, 80..=140)
//!   └── [Measure; 3]
//!         └── Vec<Event>
//!
//! Event (enum)
//!   ├── Note
//!   │     ├── pitch: Pitch (natural note name + octave)
//!   │     └── duration: Duration
//!   └── Rest
//!         └── duration: Duration
//!
//! Duration (enum)
//!   ├── Value(NoteValue)   whole, half, quarter, eighth, 16th
//!   └── Remainder(f64)     fitted final fragment of a measure
//! ```
//!
//! ## Key Concepts
//!
//! ### Quarter lengths
//! All lengths are measured in quarter notes: whole = 4.0, quarter = 1.0,
//! sixteenth = 0.25. A time signature's `beats_per_measure` uses the same unit,
//! so 3/4 is 3.0 and 4/4 is 4.0.
//!
//! ### Remainder fragments
//! When the partitioner draws a value longer than what is left of the measure,
//! it emits a `Duration::Remainder` of exactly the leftover length instead.
//! These fragments can be lengths no single note value has (2.5, 1.25).
//! They are never relabelled as quarters.
//!
//! ### Immutability
//! A `Score` is built once by the assembler and never mutated afterwards. The
//! fixed-size measure array makes the three-measure shape part of the type.
//!
//! ## Related Modules
//! - `partition` - Produces `Duration` sequences
//! - `measure` - Fills durations with `Event`s
//! - `assemble` - Builds the `Score`
//! - `musicxml` - Serializes these types

use serde::Serialize;
use std::fmt;

use crate::palette::MEASURES_PER_SCORE;

/// Clef. Generated scores always use treble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Clef {
    #[default]
    Treble,
}

impl Clef {
    /// MusicXML clef sign
    pub fn sign(&self) -> &'static str {
        match self {
            Clef::Treble => "G",
        }
    }

    /// Staff line the clef sits on
    pub fn line(&self) -> u8 {
        match self {
            Clef::Treble => 2,
        }
    }
}

/// Time signature (e.g., 4/4, 3/4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl TimeSignature {
    pub const THREE_FOUR: TimeSignature = TimeSignature {
        beats: 3,
        beat_type: 4,
    };
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        beats: 4,
        beat_type: 4,
    };

    /// Length of one full measure in quarter notes.
    /// 3/4 = 3.0, 4/4 = 4.0, 6/8 = 3.0
    pub fn beats_per_measure(&self) -> f64 {
        self.beats as f64 * 4.0 / self.beat_type as f64
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

/// Key signature (number of sharps/flats)
/// Positive = sharps, Negative = flats, Zero = C major / A minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KeySignature {
    pub fifths: i8,
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fifths {
            0 => write!(f, "no accidentals"),
            1 => write!(f, "1 sharp"),
            -1 => write!(f, "1 flat"),
            n if n > 0 => write!(f, "{} sharps", n),
            n => write!(f, "{} flats", -n),
        }
    }
}

/// Tempo in quarter-note beats per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tempo {
    pub bpm: u16,
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120 }
    }
}

/// Note names C through B, in ascending letter order from C
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Semitones above C in the same octave
    pub fn semitone(&self) -> u8 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        }
    }
}

/// A natural (accidental-free) pitch. Octave numbering follows scientific
/// pitch notation, so middle C is C4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pitch {
    pub name: NoteName,
    pub octave: u8,
}

impl Pitch {
    pub const fn new(name: NoteName, octave: u8) -> Self {
        Self { name, octave }
    }

    /// MIDI note number (C4 = 60)
    pub fn midi_number(&self) -> u8 {
        (self.octave + 1) * 12 + self.name.semitone()
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name.as_str(), self.octave)
    }
}

/// Standard note values of the duration palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteValue {
    /// Length in quarter notes
    pub fn quarter_length(&self) -> f64 {
        match self {
            NoteValue::Whole => 4.0,
            NoteValue::Half => 2.0,
            NoteValue::Quarter => 1.0,
            NoteValue::Eighth => 0.5,
            NoteValue::Sixteenth => 0.25,
        }
    }

    /// MusicXML type name
    pub fn musicxml_type(&self) -> &'static str {
        match self {
            NoteValue::Whole => "whole",
            NoteValue::Half => "half",
            NoteValue::Quarter => "quarter",
            NoteValue::Eighth => "eighth",
            NoteValue::Sixteenth => "16th",
        }
    }
}

/// Length of one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    /// One of the palette's note values
    Value(NoteValue),
    /// Final fragment of a measure, sized to exactly what was left
    Remainder(f64),
}

impl Duration {
    /// Length in quarter notes
    pub fn quarter_length(&self) -> f64 {
        match self {
            Duration::Value(value) => value.quarter_length(),
            Duration::Remainder(length) => *length,
        }
    }

    pub fn is_remainder(&self) -> bool {
        matches!(self, Duration::Remainder(_))
    }
}

impl From<NoteValue> for Duration {
    fn from(value: NoteValue) -> Self {
        Duration::Value(value)
    }
}

/// One slot in a measure: a pitched note or a rest
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Note { pitch: Pitch, duration: Duration },
    Rest { duration: Duration },
}

impl Event {
    pub fn duration(&self) -> Duration {
        match self {
            Event::Note { duration, .. } | Event::Rest { duration } => *duration,
        }
    }

    pub fn pitch(&self) -> Option<Pitch> {
        match self {
            Event::Note { pitch, .. } => Some(*pitch),
            Event::Rest { .. } => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Event::Rest { .. })
    }
}

/// A single measure of events
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Measure {
    pub events: Vec<Event>,
}

impl Measure {
    /// Sum of all event lengths in quarter notes
    pub fn total_quarter_length(&self) -> f64 {
        self.events
            .iter()
            .map(|event| event.duration().quarter_length())
            .sum()
    }

    pub fn rest_count(&self) -> usize {
        self.events.iter().filter(|event| event.is_rest()).count()
    }
}

/// A complete single-part, single-voice score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub clef: Clef,
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub tempo: Tempo,
    pub measures: [Measure; MEASURES_PER_SCORE],
}

impl Score {
    /// All events across all measures, in order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.measures.iter().flat_map(|measure| measure.events.iter())
    }
}
