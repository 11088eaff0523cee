use crate::error::IncipitError;
use crate::palette::DURATION_TOLERANCE;
use crate::score::*;

/// MusicXML divisions per quarter note. Every generated length is a whole
/// number of sixteenths.
const DIVISIONS: u32 = 4;

/// Convert a Score to MusicXML format
pub fn to_musicxml(score: &Score) -> Result<String, IncipitError> {
    let mut xml = String::new();

    // XML declaration and doctype
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 4.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">"#);
    xml.push('\n');

    // Root element
    xml.push_str(r#"<score-partwise version="4.0">"#);
    xml.push('\n');

    // Part list
    xml.push_str("  <part-list>\n");
    xml.push_str("    <score-part id=\"P1\">\n");
    xml.push_str("      <part-name print-object=\"no\"></part-name>\n");
    xml.push_str("    </score-part>\n");
    xml.push_str("  </part-list>\n");

    // Part with measures
    xml.push_str("  <part id=\"P1\">\n");

    for (i, measure) in score.measures.iter().enumerate() {
        xml.push_str(&measure_to_xml(measure, i + 1, score, i == 0)?);
    }

    xml.push_str("  </part>\n");
    xml.push_str("</score-partwise>\n");

    Ok(xml)
}

/// One notatable glyph. Remainder fragments that no single note value
/// covers become several glyphs tied together.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Glyph {
    pitch: Option<Pitch>,
    value: NoteValue,
    dots: u8,
    divisions: u32,
    tie_start: bool,
    tie_stop: bool,
}

/// Beam state for a note
#[derive(Clone, Copy, PartialEq)]
enum BeamState {
    None,
    Begin,
    Continue,
    End,
}

/// Convert a quarter length to divisions, rejecting lengths finer than a sixteenth
fn quarter_length_to_divisions(quarter_length: f64) -> Result<u32, IncipitError> {
    let scaled = quarter_length * DIVISIONS as f64;
    let rounded = scaled.round();
    if rounded < 1.0 || (scaled - rounded).abs() > DURATION_TOLERANCE {
        return Err(IncipitError::ContractViolation(format!(
            "length {} is not a whole number of sixteenths",
            quarter_length
        )));
    }
    Ok(rounded as u32)
}

fn value_divisions(value: NoteValue) -> u32 {
    match value {
        NoteValue::Whole => 16,
        NoteValue::Half => 8,
        NoteValue::Quarter => 4,
        NoteValue::Eighth => 2,
        NoteValue::Sixteenth => 1,
    }
}

/// Split a length in divisions into (value, dots, divisions) pieces, longest
/// first. 12 is a dotted half, 10 is a half tied to an eighth.
fn spell_divisions(mut remaining: u32) -> Vec<(NoteValue, u8, u32)> {
    const VALUES: [NoteValue; 5] = [
        NoteValue::Whole,
        NoteValue::Half,
        NoteValue::Quarter,
        NoteValue::Eighth,
        NoteValue::Sixteenth,
    ];

    let mut pieces = Vec::new();
    while remaining > 0 {
        let Some(&value) = VALUES.iter().find(|v| value_divisions(**v) <= remaining) else {
            break;
        };
        let base = value_divisions(value);
        let mut length = base;
        let mut dots = 0;
        let mut addition = base / 2;
        while dots < 2 && addition >= 1 && length + addition <= remaining {
            length += addition;
            dots += 1;
            addition /= 2;
        }
        pieces.push((value, dots, length));
        remaining -= length;
    }
    pieces
}

/// Expand one event into glyphs
fn event_glyphs(event: &Event) -> Result<Vec<Glyph>, IncipitError> {
    let pitch = event.pitch();
    let pieces = match event.duration() {
        Duration::Value(value) => vec![(value, 0, value_divisions(value))],
        Duration::Remainder(length) => spell_divisions(quarter_length_to_divisions(length)?),
    };

    let count = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(i, (value, dots, divisions))| Glyph {
            pitch,
            value,
            dots,
            divisions,
            // Rests are never tied
            tie_start: pitch.is_some() && i + 1 < count,
            tie_stop: pitch.is_some() && i > 0,
        })
        .collect())
}

/// Check if a value is beamable (eighth note or shorter)
fn is_beamable(value: NoteValue) -> bool {
    matches!(value, NoteValue::Eighth | NoteValue::Sixteenth)
}

fn is_beamable_glyph(glyph: &Glyph) -> bool {
    glyph.pitch.is_some() && is_beamable(glyph.value)
}

/// Calculate beam states for all glyphs in a measure, respecting beat boundaries
fn calculate_beam_states(glyphs: &[Glyph], time_signature: &TimeSignature) -> Vec<BeamState> {
    let mut states = vec![BeamState::None; glyphs.len()];

    // 4/4 and 3/4: one beat = 4 divisions
    let beat_divisions = (DIVISIONS * 4 / time_signature.beat_type as u32).max(1);

    let mut position: u32 = 0;
    let mut i = 0;

    while i < glyphs.len() {
        let beat_end_pos = (position / beat_divisions + 1) * beat_divisions;

        if is_beamable_glyph(&glyphs[i]) {
            // Consecutive beamable notes within the same beat
            let start = i;
            let mut group_position = position;

            while i < glyphs.len() && group_position < beat_end_pos && is_beamable_glyph(&glyphs[i]) {
                if group_position + glyphs[i].divisions > beat_end_pos && i > start {
                    break;
                }
                group_position += glyphs[i].divisions;
                i += 1;
            }
            let end = i;

            // Only beam if we have 2 or more consecutive beamable notes
            if end - start >= 2 {
                states[start] = BeamState::Begin;
                for state in states.iter_mut().take(end - 1).skip(start + 1) {
                    *state = BeamState::Continue;
                }
                states[end - 1] = BeamState::End;
            }

            position = group_position;
        } else {
            position += glyphs[i].divisions;
            i += 1;
        }
    }

    states
}

/// Whether the key signature sharps or flats this letter.
/// Order of sharps: F C G D A E B
/// Order of flats: B E A D G C F
fn key_alters(key_signature: &KeySignature, name: NoteName) -> bool {
    const SHARPS: [NoteName; 7] = [
        NoteName::F,
        NoteName::C,
        NoteName::G,
        NoteName::D,
        NoteName::A,
        NoteName::E,
        NoteName::B,
    ];
    const FLATS: [NoteName; 7] = [
        NoteName::B,
        NoteName::E,
        NoteName::A,
        NoteName::D,
        NoteName::G,
        NoteName::C,
        NoteName::F,
    ];

    let count = key_signature.fifths.unsigned_abs().min(7) as usize;
    if key_signature.fifths > 0 {
        SHARPS[..count].contains(&name)
    } else {
        FLATS[..count].contains(&name)
    }
}

fn measure_to_xml(
    measure: &Measure,
    number: usize,
    score: &Score,
    include_attributes: bool,
) -> Result<String, IncipitError> {
    let mut xml = String::new();

    xml.push_str(&format!("    <measure number=\"{}\">\n", number));

    // Key, time signature, clef and tempo on the first measure only
    if include_attributes {
        xml.push_str("      <attributes>\n");
        xml.push_str(&format!("        <divisions>{}</divisions>\n", DIVISIONS));
        xml.push_str("        <key>\n");
        xml.push_str(&format!("          <fifths>{}</fifths>\n", score.key_signature.fifths));
        xml.push_str("        </key>\n");
        xml.push_str("        <time>\n");
        xml.push_str(&format!("          <beats>{}</beats>\n", score.time_signature.beats));
        xml.push_str(&format!(
            "          <beat-type>{}</beat-type>\n",
            score.time_signature.beat_type
        ));
        xml.push_str("        </time>\n");
        xml.push_str("        <clef>\n");
        xml.push_str(&format!("          <sign>{}</sign>\n", score.clef.sign()));
        xml.push_str(&format!("          <line>{}</line>\n", score.clef.line()));
        xml.push_str("        </clef>\n");
        xml.push_str("      </attributes>\n");
        xml.push_str(&tempo_to_xml(&score.tempo));
    }

    let mut glyphs = Vec::new();
    for event in &measure.events {
        glyphs.extend(event_glyphs(event)?);
    }

    let beam_states = calculate_beam_states(&glyphs, &score.time_signature);

    // Naturals cancel the key signature once per pitch per measure
    let mut cancelled: Vec<Pitch> = Vec::new();

    for (glyph, beam_state) in glyphs.iter().zip(beam_states.iter()) {
        match glyph.pitch {
            Some(pitch) => {
                let show_natural = !glyph.tie_stop
                    && key_alters(&score.key_signature, pitch.name)
                    && !cancelled.contains(&pitch);
                if show_natural {
                    cancelled.push(pitch);
                }
                xml.push_str(&note_to_xml(pitch, glyph, *beam_state, show_natural));
            }
            None => xml.push_str(&rest_to_xml(glyph)),
        }
    }

    xml.push_str("    </measure>\n");
    Ok(xml)
}

fn tempo_to_xml(tempo: &Tempo) -> String {
    let mut xml = String::new();
    xml.push_str("      <direction placement=\"above\">\n");
    xml.push_str("        <direction-type>\n");
    xml.push_str("          <metronome parentheses=\"no\">\n");
    xml.push_str("            <beat-unit>quarter</beat-unit>\n");
    xml.push_str(&format!("            <per-minute>{}</per-minute>\n", tempo.bpm));
    xml.push_str("          </metronome>\n");
    xml.push_str("        </direction-type>\n");
    xml.push_str(&format!("        <sound tempo=\"{}\"/>\n", tempo.bpm));
    xml.push_str("      </direction>\n");
    xml
}

fn note_to_xml(pitch: Pitch, glyph: &Glyph, beam_state: BeamState, show_natural: bool) -> String {
    let mut xml = String::new();

    xml.push_str("      <note>\n");

    xml.push_str("        <pitch>\n");
    xml.push_str(&format!("          <step>{}</step>\n", pitch.name.as_str()));
    xml.push_str(&format!("          <octave>{}</octave>\n", pitch.octave));
    xml.push_str("        </pitch>\n");

    xml.push_str(&format!("        <duration>{}</duration>\n", glyph.divisions));

    // Ties (for playback - must come before <type>)
    if glyph.tie_stop {
        xml.push_str("        <tie type=\"stop\"/>\n");
    }
    if glyph.tie_start {
        xml.push_str("        <tie type=\"start\"/>\n");
    }

    xml.push_str(&format!("        <type>{}</type>\n", glyph.value.musicxml_type()));
    for _ in 0..glyph.dots {
        xml.push_str("        <dot/>\n");
    }

    if show_natural {
        xml.push_str("        <accidental>natural</accidental>\n");
    }

    match beam_state {
        BeamState::Begin => xml.push_str("        <beam number=\"1\">begin</beam>\n"),
        BeamState::Continue => xml.push_str("        <beam number=\"1\">continue</beam>\n"),
        BeamState::End => xml.push_str("        <beam number=\"1\">end</beam>\n"),
        BeamState::None => {}
    }

    // Tied notations (for visual display)
    if glyph.tie_start || glyph.tie_stop {
        xml.push_str("        <notations>\n");
        if glyph.tie_stop {
            xml.push_str("          <tied type=\"stop\"/>\n");
        }
        if glyph.tie_start {
            xml.push_str("          <tied type=\"start\"/>\n");
        }
        xml.push_str("        </notations>\n");
    }

    xml.push_str("      </note>\n");
    xml
}

fn rest_to_xml(glyph: &Glyph) -> String {
    let mut xml = String::new();

    xml.push_str("      <note>\n");
    xml.push_str("        <rest/>\n");
    xml.push_str(&format!("        <duration>{}</duration>\n", glyph.divisions));
    xml.push_str(&format!("        <type>{}</type>\n", glyph.value.musicxml_type()));
    for _ in 0..glyph.dots {
        xml.push_str("        <dot/>\n");
    }
    xml.push_str("      </note>\n");
    xml
}
