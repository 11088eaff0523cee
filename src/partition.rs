//! # Duration Partitioner
//!
//! Splits a measure's length into a sequence of durations that add up to it
//! exactly.
//!
//! ## Algorithm
//! Keep `remaining = beats_per_measure`. While `remaining > 0`, draw a note value
//! uniformly from the palette. If it fits, append it. If it is longer than
//! `remaining`, append a `Duration::Remainder` of exactly `remaining` instead,
//! which empties the measure. Subtract and repeat.
//!
//! The fitted fragment is always the last slot of its measure. Palette lengths
//! are powers of two, so the subtraction is exact in `f64` and the sum comes
//! out equal to the target, not just close to it.
//!
//! ## Example
//! ```rust
//! use incipit::{partition, create_rng};
//!
//! let mut rng = create_rng(1);
//! let durations = partition(3.0, &mut rng)?;
//! let total: f64 = durations.iter().map(|d| d.quarter_length()).sum();
//! assert_eq!(total, 3.0);
//! # Ok::<(), incipit::IncipitError>(())
//! ```

use crate::error::IncipitError;
use crate::palette::DURATION_PALETTE;
use crate::random::RandomSource;
use crate::score::{Duration, NoteValue};

/// Partition `beats_per_measure` using the standard palette.
pub fn partition<R: RandomSource + ?Sized>(
    beats_per_measure: f64,
    rng: &mut R,
) -> Result<Vec<Duration>, IncipitError> {
    partition_from(beats_per_measure, &DURATION_PALETTE, rng)
}

/// Partition `beats_per_measure` drawing from an explicit palette.
pub fn partition_from<R: RandomSource + ?Sized>(
    beats_per_measure: f64,
    palette: &[NoteValue],
    rng: &mut R,
) -> Result<Vec<Duration>, IncipitError> {
    if palette.is_empty() {
        return Err(IncipitError::ContractViolation(
            "duration palette is empty".to_string(),
        ));
    }
    if !beats_per_measure.is_finite() || beats_per_measure <= 0.0 {
        return Err(IncipitError::ContractViolation(format!(
            "beats per measure must be positive, got {}",
            beats_per_measure
        )));
    }

    let mut durations = Vec::new();
    let mut remaining = beats_per_measure;

    while remaining > 0.0 {
        let value = palette[rng.pick_index(palette.len())];
        let duration = if value.quarter_length() > remaining {
            Duration::Remainder(remaining)
        } else {
            Duration::Value(value)
        };

        durations.push(duration);
        remaining -= duration.quarter_length();
    }

    Ok(durations)
}
