//! Chromatic note names and shuffling for the note-generator widget.

use rand::Rng;

/// The twelve chromatic pitch classes, enharmonic pairs shown together.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

/// Fisher-Yates shuffle of the full chromatic set: every note exactly once,
/// in random order.
pub fn shuffled_notes<R: Rng>(rng: &mut R) -> [&'static str; 12] {
    let mut notes = NOTE_NAMES;
    for i in (1..notes.len()).rev() {
        let j = rng.gen_range(0..=i);
        notes.swap(i, j);
    }
    notes
}
