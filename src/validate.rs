//! # Score Validation Module
//!
//! This module checks a finished score against the rules every generated
//! incipit must satisfy.
//!
//! ## Purpose
//! Generation is correct by construction, so a failure here always means a
//! defect in the generator. The assembler runs `validate` before handing a
//! score out, which turns such a defect into a loud error for that piece
//! instead of a silently broken file.
//!
//! ## Validation Rules
//!
//! ### Measure Duration
//! - Each measure's total length must equal the time signature's beats per
//!   measure, within `DURATION_TOLERANCE`
//! - Every event must have a positive length
//! - Empty measures are rejected
//!
//! ### Ranges
//! - Key signature fifths within -2..=2
//! - Tempo within 80..=140 BPM
//! - Time signature is 3/4 or 4/4
//!
//! ### Pitches
//! - Every note's pitch is a member of the pitch pool
//!
//! ## Entry Point
//! `validate(score: &Score) -> Result<(), IncipitError>`

use crate::error::IncipitError;
use crate::palette::{
    DURATION_TOLERANCE, KEY_FIFTHS_RANGE, PITCH_POOL, TEMPO_RANGE, TIME_SIGNATURE_OPTIONS,
};
use crate::score::*;

/// Validate a score
///
/// Checks the global settings first, then each measure in order.
pub fn validate(score: &Score) -> Result<(), IncipitError> {
    validate_settings(score)?;
    for (i, measure) in score.measures.iter().enumerate() {
        validate_measure(measure, &score.time_signature, i + 1)?;
    }
    Ok(())
}

/// Validate key, meter and tempo ranges
fn validate_settings(score: &Score) -> Result<(), IncipitError> {
    if !KEY_FIFTHS_RANGE.contains(&score.key_signature.fifths) {
        return Err(IncipitError::ContractViolation(format!(
            "key signature {} is outside {:?}",
            score.key_signature.fifths, KEY_FIFTHS_RANGE
        )));
    }
    if !TIME_SIGNATURE_OPTIONS.contains(&score.time_signature) {
        return Err(IncipitError::ContractViolation(format!(
            "time signature {} is not one of the generated meters",
            score.time_signature
        )));
    }
    if !TEMPO_RANGE.contains(&score.tempo.bpm) {
        return Err(IncipitError::ContractViolation(format!(
            "tempo {} BPM is outside {:?}",
            score.tempo.bpm, TEMPO_RANGE
        )));
    }
    Ok(())
}

/// Validate a single measure
fn validate_measure(
    measure: &Measure,
    time_sig: &TimeSignature,
    measure_number: usize,
) -> Result<(), IncipitError> {
    if measure.events.is_empty() {
        return Err(IncipitError::InvalidMeasure {
            measure: measure_number,
            message: "Measure has no events".to_string(),
        });
    }

    for event in &measure.events {
        let length = event.duration().quarter_length();
        if !length.is_finite() || length <= 0.0 {
            return Err(IncipitError::InvalidMeasure {
                measure: measure_number,
                message: format!("Event has non-positive length {}", length),
            });
        }
        if let Some(pitch) = event.pitch() {
            if !PITCH_POOL.contains(&pitch) {
                return Err(IncipitError::InvalidMeasure {
                    measure: measure_number,
                    message: format!("Pitch {} is outside the C4-C6 pool", pitch),
                });
            }
        }
    }

    let expected = time_sig.beats_per_measure();
    let actual = measure.total_quarter_length();

    if (actual - expected).abs() > DURATION_TOLERANCE {
        return Err(IncipitError::InvalidMeasure {
            measure: measure_number,
            message: format!(
                "Measure duration ({} beats) doesn't match time signature ({} = {} beats)",
                actual, time_sig, expected
            ),
        });
    }

    Ok(())
}
