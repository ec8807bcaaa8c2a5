//! Tempo limits and the linear practice-ramp interpolation.

/// Slowest supported metronome tempo.
pub const MIN_BPM: u16 = 40;

/// Fastest supported metronome tempo.
pub const MAX_BPM: u16 = 240;

/// Clamp an arbitrary tempo into the supported range.
pub fn clamp_bpm(bpm: i32) -> u16 {
    bpm.clamp(MIN_BPM as i32, MAX_BPM as i32) as u16
}

/// Seconds between beats at a given tempo.
pub fn period_secs(bpm: u16) -> f64 {
    60.0 / bpm as f64
}

/// Linear tempo ramp from `start_bpm` to `finish_bpm` over `duration_ms`.
///
/// Works in either direction (finish below start ramps downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRamp {
    pub start_bpm: u16,
    pub finish_bpm: u16,
    pub duration_ms: f64,
}

/// Shortest accepted practice duration: 0.1 minutes.
const MIN_DURATION_MS: f64 = 6_000.0;

impl TempoRamp {
    /// Build a ramp, clamping tempos into range and the duration to its floor.
    pub fn new(start_bpm: i32, finish_bpm: i32, duration_ms: f64) -> Self {
        Self {
            start_bpm: clamp_bpm(start_bpm),
            finish_bpm: clamp_bpm(finish_bpm),
            duration_ms: if duration_ms.is_finite() {
                duration_ms.max(MIN_DURATION_MS)
            } else {
                MIN_DURATION_MS
            },
        }
    }

    /// Interpolated tempo at `elapsed_ms`, rounded to the nearest integer
    /// and pinned at the finish tempo once the duration is exhausted.
    pub fn bpm_at(&self, elapsed_ms: f64) -> u16 {
        let progress = (elapsed_ms / self.duration_ms).clamp(0.0, 1.0);
        let diff = self.finish_bpm as f64 - self.start_bpm as f64;
        libm::round(self.start_bpm as f64 + diff * progress) as u16
    }
}

/// Ramp state for an advanced-mode practice session.
///
/// Tracks how far into the ramp the session is and whether the ramp is still
/// driving the tempo. Once elapsed time reaches the duration the tempo pins
/// at the finish value and progression halts.
#[derive(Clone, Copy, Debug)]
pub struct Progression {
    pub ramp: TempoRamp,
    elapsed_ms: f64,
    progressing: bool,
}

impl Progression {
    pub fn new(ramp: TempoRamp) -> Self {
        Self { ramp, elapsed_ms: 0.0, progressing: false }
    }

    pub fn is_progressing(&self) -> bool {
        self.progressing
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Begin (or resume) progressing from the current elapsed position.
    pub fn begin(&mut self) {
        self.progressing = true;
    }

    pub fn halt(&mut self) {
        self.progressing = false;
    }

    /// Discard session progress, e.g. after a ramp parameter edit.
    pub fn rewind(&mut self) {
        self.elapsed_ms = 0.0;
        self.progressing = false;
    }

    /// Jump to a fraction of the practice duration (progress seek).
    pub fn seek(&mut self, fraction: f64) {
        self.elapsed_ms = fraction.clamp(0.0, 1.0) * self.ramp.duration_ms;
    }

    /// Tempo at the current session position.
    pub fn current_bpm(&self) -> u16 {
        self.ramp.bpm_at(self.elapsed_ms)
    }

    /// Move the session position forward and return `(bpm, just_completed)`.
    ///
    /// Completion fires exactly once: elapsed is capped at the duration, the
    /// tempo pins at the finish value, and progression stops.
    pub fn advance(&mut self, session_elapsed_ms: f64) -> (u16, bool) {
        if !self.progressing {
            return (self.current_bpm(), false);
        }
        self.elapsed_ms = session_elapsed_ms;
        if self.elapsed_ms >= self.ramp.duration_ms {
            self.elapsed_ms = self.ramp.duration_ms;
            self.progressing = false;
            (self.ramp.finish_bpm, true)
        } else {
            (self.ramp.bpm_at(self.elapsed_ms), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bpm_bounds() {
        assert_eq!(clamp_bpm(10), MIN_BPM);
        assert_eq!(clamp_bpm(1000), MAX_BPM);
        assert_eq!(clamp_bpm(120), 120);
    }

    #[test]
    fn period_at_120_is_half_second() {
        assert_eq!(period_secs(120), 0.5);
    }

    #[test]
    fn ramp_endpoints() {
        let ramp = TempoRamp::new(60, 120, 60_000.0);
        assert_eq!(ramp.bpm_at(0.0), 60);
        assert_eq!(ramp.bpm_at(60_000.0), 120);
    }

    #[test]
    fn ramp_midpoint_rounds() {
        let ramp = TempoRamp::new(60, 121, 60_000.0);
        // 60 + 61 * 0.5 = 90.5 -> 91
        assert_eq!(ramp.bpm_at(30_000.0), 91);
    }

    #[test]
    fn ramp_is_monotonic_upward() {
        let ramp = TempoRamp::new(40, 240, 120_000.0);
        let mut last = 0;
        for step in 0..=120 {
            let bpm = ramp.bpm_at(step as f64 * 1000.0);
            assert!(bpm >= last, "tempo went backwards at step {}", step);
            last = bpm;
        }
        assert_eq!(last, 240);
    }

    #[test]
    fn ramp_is_monotonic_downward() {
        let ramp = TempoRamp::new(200, 80, 120_000.0);
        let mut last = u16::MAX;
        for step in 0..=120 {
            let bpm = ramp.bpm_at(step as f64 * 1000.0);
            assert!(bpm <= last, "tempo went upwards at step {}", step);
            last = bpm;
        }
        assert_eq!(last, 80);
    }

    #[test]
    fn ramp_pins_past_duration() {
        let ramp = TempoRamp::new(60, 120, 60_000.0);
        assert_eq!(ramp.bpm_at(90_000.0), 120);
    }

    #[test]
    fn ramp_clamps_inputs() {
        let ramp = TempoRamp::new(10, 999, 100.0);
        assert_eq!(ramp.start_bpm, MIN_BPM);
        assert_eq!(ramp.finish_bpm, MAX_BPM);
        assert_eq!(ramp.duration_ms, 6_000.0);
    }

    #[test]
    fn progression_completes_once_and_pins() {
        let mut prog = Progression::new(TempoRamp::new(60, 120, 10_000.0));
        prog.begin();

        let (bpm, done) = prog.advance(5_000.0);
        assert_eq!(bpm, 90);
        assert!(!done);

        let (bpm, done) = prog.advance(10_000.0);
        assert_eq!(bpm, 120);
        assert!(done);
        assert!(!prog.is_progressing());

        // Further advances stay pinned and never re-complete.
        let (bpm, done) = prog.advance(20_000.0);
        assert_eq!(bpm, 120);
        assert!(!done);
        assert_eq!(prog.elapsed_ms(), 10_000.0);
    }

    #[test]
    fn progression_seek_moves_position() {
        let mut prog = Progression::new(TempoRamp::new(60, 120, 10_000.0));
        prog.begin();
        prog.seek(0.5);
        assert_eq!(prog.elapsed_ms(), 5_000.0);
        assert_eq!(prog.current_bpm(), 90);
    }

    #[test]
    fn rewind_discards_progress() {
        let mut prog = Progression::new(TempoRamp::new(60, 120, 10_000.0));
        prog.begin();
        prog.advance(4_000.0);
        prog.rewind();
        assert_eq!(prog.elapsed_ms(), 0.0);
        assert!(!prog.is_progressing());
        assert_eq!(prog.current_bpm(), 60);
    }
}
