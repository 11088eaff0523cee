//! # Score Assembler
//!
//! Chooses a piece's global settings and fills it with measures.
//!
//! ## Steps
//! 1. Clef is always treble
//! 2. Key signature: uniform over -2..=2 fifths
//! 3. Time signature: uniform over 3/4 and 4/4
//! 4. Tempo: uniform integer over 80..=140 BPM
//! 5. Three measures, all generated for the same beats per measure
//!
//! The finished score is validated before it is returned.
//!
//! ## Example
//! ```rust
//! use incipit::{assemble_score, create_rng};
//!
//! let mut rng = create_rng(42);
//! let score = assemble_score(&mut rng)?;
//! assert_eq!(score.measures.len(), 3);
//! # Ok::<(), incipit::IncipitError>(())
//! ```

use log::debug;

use crate::error::IncipitError;
use crate::measure::generate_measure;
use crate::palette::{KEY_FIFTHS_RANGE, MEASURES_PER_SCORE, TEMPO_RANGE, TIME_SIGNATURE_OPTIONS};
use crate::random::RandomSource;
use crate::score::*;
use crate::validate::validate;

/// Assemble a complete score, drawing every setting at random.
pub fn assemble_score<R: RandomSource + ?Sized>(rng: &mut R) -> Result<Score, IncipitError> {
    let key_signature = draw_key_signature(rng)?;
    let time_signature = TIME_SIGNATURE_OPTIONS[rng.pick_index(TIME_SIGNATURE_OPTIONS.len())];
    let tempo = draw_tempo(rng)?;
    build_score(key_signature, time_signature, tempo, rng)
}

/// Assemble a score in a caller-chosen time signature. Key and tempo are
/// still drawn at random.
pub fn assemble_score_in<R: RandomSource + ?Sized>(
    time_signature: TimeSignature,
    rng: &mut R,
) -> Result<Score, IncipitError> {
    let key_signature = draw_key_signature(rng)?;
    let tempo = draw_tempo(rng)?;
    build_score(key_signature, time_signature, tempo, rng)
}

fn draw_key_signature<R: RandomSource + ?Sized>(rng: &mut R) -> Result<KeySignature, IncipitError> {
    let fifths = rng.int_in(
        i64::from(*KEY_FIFTHS_RANGE.start()),
        i64::from(*KEY_FIFTHS_RANGE.end()),
    );
    let fifths = i8::try_from(fifths).map_err(|_| {
        IncipitError::ContractViolation(format!("key signature draw {} out of range", fifths))
    })?;
    Ok(KeySignature { fifths })
}

fn draw_tempo<R: RandomSource + ?Sized>(rng: &mut R) -> Result<Tempo, IncipitError> {
    let bpm = rng.int_in(
        i64::from(*TEMPO_RANGE.start()),
        i64::from(*TEMPO_RANGE.end()),
    );
    let bpm = u16::try_from(bpm)
        .map_err(|_| IncipitError::ContractViolation(format!("tempo draw {} out of range", bpm)))?;
    Ok(Tempo { bpm })
}

fn build_score<R: RandomSource + ?Sized>(
    key_signature: KeySignature,
    time_signature: TimeSignature,
    tempo: Tempo,
    rng: &mut R,
) -> Result<Score, IncipitError> {
    let beats_per_measure = time_signature.beats_per_measure();

    let measures = (0..MEASURES_PER_SCORE)
        .map(|_| generate_measure(beats_per_measure, rng))
        .collect::<Result<Vec<_>, _>>()?;
    let measures: [Measure; MEASURES_PER_SCORE] = measures.try_into().map_err(|_| {
        IncipitError::ContractViolation(format!(
            "expected {} measures",
            MEASURES_PER_SCORE
        ))
    })?;

    let score = Score {
        clef: Clef::Treble,
        key_signature,
        time_signature,
        tempo,
        measures,
    };

    validate(&score)?;

    debug!(
        "Assembled score: {}, {}, {} BPM, {} events",
        score.time_signature,
        score.key_signature,
        score.tempo.bpm,
        score.events().count()
    );

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{DURATION_TOLERANCE, PITCH_POOL};
    use crate::random::{create_rng, ScriptedSource};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_four_four_measures_sum_to_four() {
        for seed in 0..100 {
            let mut rng = create_rng(seed);
            let score = assemble_score_in(TimeSignature::FOUR_FOUR, &mut rng).unwrap();
            assert_eq!(score.time_signature, TimeSignature::FOUR_FOUR);
            for measure in &score.measures {
                assert!((measure.total_quarter_length() - 4.0).abs() < DURATION_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_settings_stay_in_range() {
        let mut rng = create_rng(77);
        for _ in 0..300 {
            let score = assemble_score(&mut rng).unwrap();
            assert_eq!(score.clef, Clef::Treble);
            assert!((-2..=2).contains(&score.key_signature.fifths));
            assert!((80..=140).contains(&score.tempo.bpm));
            assert!(TIME_SIGNATURE_OPTIONS.contains(&score.time_signature));
            assert_eq!(score.measures.len(), 3);
            for pitch in score.events().filter_map(|e| e.pitch()) {
                assert!(PITCH_POOL.contains(&pitch));
            }
        }
    }

    #[test]
    fn test_all_measures_share_the_meter() {
        let mut rng = create_rng(8);
        for _ in 0..100 {
            let score = assemble_score(&mut rng).unwrap();
            let beats = score.time_signature.beats_per_measure();
            for measure in &score.measures {
                assert!((measure.total_quarter_length() - beats).abs() < DURATION_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_both_meters_and_all_keys_occur() {
        let mut rng = create_rng(31);
        let scores: Vec<Score> = (0..200).map(|_| assemble_score(&mut rng).unwrap()).collect();
        for time_sig in TIME_SIGNATURE_OPTIONS {
            assert!(scores.iter().any(|s| s.time_signature == time_sig));
        }
        for fifths in -2..=2 {
            assert!(scores.iter().any(|s| s.key_signature.fifths == fifths));
        }
    }

    #[test]
    fn test_same_seed_same_score() {
        let first = assemble_score(&mut create_rng(123)).unwrap();
        let second = assemble_score(&mut create_rng(123)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scripted_settings() {
        // key -2, meter index 0 (3/4), tempo 80; every measure draws a whole
        // into 3/4, so it fits to a single 3.0 fragment
        let mut rng = ScriptedSource {
            picks: [0, 0, 0, 0].into_iter().collect(),
            chances: [true, true, true].into_iter().collect(),
            ints: [-2, 80].into_iter().collect(),
        };
        let score = assemble_score(&mut rng).unwrap();

        assert_eq!(score.key_signature, KeySignature { fifths: -2 });
        assert_eq!(score.tempo, Tempo { bpm: 80 });
        assert_eq!(score.time_signature, TimeSignature::THREE_FOUR);
        for measure in &score.measures {
            assert_eq!(
                measure.events,
                vec![Event::Rest {
                    duration: Duration::Remainder(3.0)
                }]
            );
        }
    }
}
