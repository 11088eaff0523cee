//! # Measure Generator
//!
//! Turns a partition into a measure of notes and rests.
//!
//! Each duration slot independently becomes a rest with probability
//! `REST_PROBABILITY`, otherwise a note whose pitch is drawn uniformly from
//! the pitch pool. There is no melodic smoothing: consecutive pitches are
//! independent draws.
//!
//! The partition is drawn in full first, then the slots are filled left to
//! right (rest draw, then pitch draw for notes).

use crate::error::IncipitError;
use crate::palette::{PITCH_POOL, REST_PROBABILITY};
use crate::partition::partition;
use crate::random::RandomSource;
use crate::score::{Event, Measure, Pitch};

/// Generate one measure of exactly `beats_per_measure` quarter notes.
pub fn generate_measure<R: RandomSource + ?Sized>(
    beats_per_measure: f64,
    rng: &mut R,
) -> Result<Measure, IncipitError> {
    generate_measure_from(beats_per_measure, &PITCH_POOL, REST_PROBABILITY, rng)
}

/// Generate one measure with an explicit pitch pool and rest probability.
pub fn generate_measure_from<R: RandomSource + ?Sized>(
    beats_per_measure: f64,
    pitch_pool: &[Pitch],
    rest_probability: f64,
    rng: &mut R,
) -> Result<Measure, IncipitError> {
    if pitch_pool.is_empty() {
        return Err(IncipitError::ContractViolation(
            "pitch pool is empty".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&rest_probability) {
        return Err(IncipitError::ContractViolation(format!(
            "rest probability must be within [0, 1], got {}",
            rest_probability
        )));
    }

    let durations = partition(beats_per_measure, rng)?;

    let events = durations
        .into_iter()
        .map(|duration| {
            if rng.chance(rest_probability) {
                Event::Rest { duration }
            } else {
                let pitch = pitch_pool[rng.pick_index(pitch_pool.len())];
                Event::Note { pitch, duration }
            }
        })
        .collect();

    Ok(Measure { events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::DURATION_TOLERANCE;
    use crate::random::{create_rng, ScriptedSource};
    use crate::score::{Duration, NoteName, NoteValue};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scripted_measure() {
        let mut rng = ScriptedSource {
            // durations: half, quarter, quarter; then pitches E4 and C6
            picks: [1, 2, 2, 2, 14].into_iter().collect(),
            chances: [false, true, false].into_iter().collect(),
            ints: Default::default(),
        };
        let measure = generate_measure(4.0, &mut rng).unwrap();

        assert_eq!(
            measure.events,
            vec![
                Event::Note {
                    pitch: Pitch::new(NoteName::E, 4),
                    duration: Duration::Value(NoteValue::Half),
                },
                Event::Rest {
                    duration: Duration::Value(NoteValue::Quarter),
                },
                Event::Note {
                    pitch: Pitch::new(NoteName::C, 6),
                    duration: Duration::Value(NoteValue::Quarter),
                },
            ]
        );
    }

    #[test]
    fn test_measures_sum_exactly() {
        let mut rng = create_rng(2024);
        for beats in [3.0, 4.0] {
            for _ in 0..300 {
                let measure = generate_measure(beats, &mut rng).unwrap();
                assert!((measure.total_quarter_length() - beats).abs() < DURATION_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_pitches_come_from_pool() {
        let mut rng = create_rng(5);
        for _ in 0..200 {
            let measure = generate_measure(4.0, &mut rng).unwrap();
            for pitch in measure.events.iter().filter_map(|e| e.pitch()) {
                assert!(PITCH_POOL.contains(&pitch), "{} not in pool", pitch);
            }
        }
    }

    #[test]
    fn test_rest_ratio_near_one_fifth() {
        let mut rng = create_rng(0x1ec7);
        let mut events = 0usize;
        let mut rests = 0usize;
        while events < 10_000 {
            let measure = generate_measure(4.0, &mut rng).unwrap();
            events += measure.events.len();
            rests += measure.rest_count();
        }
        let ratio = rests as f64 / events as f64;
        assert!((ratio - 0.2).abs() < 0.02, "rest ratio {}", ratio);
    }

    #[test]
    fn test_all_rests_and_no_rests() {
        let mut rng = create_rng(9);
        let silent = generate_measure_from(3.0, &PITCH_POOL, 1.0, &mut rng).unwrap();
        assert!(silent.events.iter().all(|e| e.is_rest()));

        let busy = generate_measure_from(3.0, &PITCH_POOL, 0.0, &mut rng).unwrap();
        assert!(busy.events.iter().all(|e| !e.is_rest()));
    }

    #[test]
    fn test_rejects_empty_pool() {
        let mut rng = create_rng(0);
        assert!(matches!(
            generate_measure_from(4.0, &[], 0.2, &mut rng),
            Err(IncipitError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_rest_probability() {
        let mut rng = create_rng(0);
        assert!(matches!(
            generate_measure_from(4.0, &PITCH_POOL, 1.5, &mut rng),
            Err(IncipitError::ContractViolation(_))
        ));
    }

    #[test]
    fn test_rejects_zero_length_measure() {
        let mut rng = create_rng(0);
        assert!(generate_measure(0.0, &mut rng).is_err());
    }
}
