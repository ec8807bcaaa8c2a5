//! Note-generator widget: random practice orderings of the chromatic scale.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use ws_core::{shuffled_notes, NOTE_NAMES};

pub struct NoteGenerator {
    rng: SmallRng,
    current: [&'static str; 12],
}

impl NoteGenerator {
    /// Seeded so a host can make sessions reproducible; binaries seed from
    /// entropy, tests from constants.
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed), current: NOTE_NAMES }
    }

    /// Shuffle and return the new ordering.
    pub fn generate(&mut self) -> &[&'static str; 12] {
        self.current = shuffled_notes(&mut self.rng);
        &self.current
    }

    /// The last generated ordering (the plain scale before any generate).
    pub fn current(&self) -> &[&'static str; 12] {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_the_plain_scale() {
        let gen = NoteGenerator::new(1);
        assert_eq!(gen.current(), &NOTE_NAMES);
    }

    #[test]
    fn generate_keeps_all_twelve_notes() {
        let mut gen = NoteGenerator::new(99);
        let notes = *gen.generate();
        for name in NOTE_NAMES {
            assert!(notes.contains(&name));
        }
    }

    #[test]
    fn sequences_differ_across_generates() {
        let mut gen = NoteGenerator::new(7);
        let first = *gen.generate();
        let mut changed = false;
        for _ in 0..5 {
            if *gen.generate() != first {
                changed = true;
                break;
            }
        }
        assert!(changed, "five consecutive identical shuffles");
    }
}
